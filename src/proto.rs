// Generated from proto/ by build.rs.

pub mod order {
    tonic::include_proto!("order");
}

pub mod user {
    tonic::include_proto!("user");
}

pub mod product {
    tonic::include_proto!("product");
}

/// Encoded descriptors for server reflection.
pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("order_descriptor");
