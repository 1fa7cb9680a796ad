// Generated from proto/*.proto by build.rs

pub mod common {
    tonic::include_proto!("records.common");

    impl MessageRes {
        pub fn new(message: impl Into<String>) -> Self {
            Self {
                message: message.into(),
            }
        }
    }
}

pub mod items {
    tonic::include_proto!("records.items");
}

pub mod clock_in {
    tonic::include_proto!("records.clock_in");
}

/// Encoded descriptors of every compiled proto file, served over reflection.
pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("stock_clock_descriptor");
