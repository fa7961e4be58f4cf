//! Shared test utilities


pub use mock_transport::MockTransport;
