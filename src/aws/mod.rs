//! AWS-backed instance discovery

pub mod context;
pub mod ec2;

pub use context::AwsContext;
pub use ec2::Ec2InstanceSource;
