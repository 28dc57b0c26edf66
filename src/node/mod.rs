mod follower;
mod leader;
mod role;

pub use follower::FollowerRole;
pub use follower::JoinError;
pub use leader::LeaderRole;
pub use leader::ReplicationError;
pub use role::Role;
