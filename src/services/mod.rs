pub mod dispatch_service;
pub mod notification_response;
