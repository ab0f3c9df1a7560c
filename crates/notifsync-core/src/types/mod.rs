//! Core type definitions used across the notifsync workspace.

pub mod id;
pub mod navigation;
pub mod notification;

pub use id::{LOCAL_ID_PREFIX, UserId, generate_local_id, is_local_id};
pub use navigation::Destination;
pub use notification::{
    LocalContent, NotificationData, NotificationRecord, NotificationResponse, NotificationType,
    Scalar,
};
