pub mod mock_relays;
