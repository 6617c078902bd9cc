//! Broker reply codes.
//!
//! Numeric status codes a broker attaches to a connection or channel close,
//! as defined by AMQP 0-9-1. Only [`CONNECTION_FORCED`] has special meaning
//! to the connector; the rest exist so adapters and logs can name what they
//! received.

/// Normal, requested shutdown.
pub const REPLY_SUCCESS: u16 = 200;
/// Content too large for the channel.
pub const CONTENT_TOO_LARGE: u16 = 311;
/// No route for a mandatory message.
pub const NO_ROUTE: u16 = 312;
/// No consumers for an immediate message.
pub const NO_CONSUMERS: u16 = 313;
/// The peer (or an operator) closed the connection.
pub const CONNECTION_FORCED: u16 = 320;
/// Unknown virtual host.
pub const INVALID_PATH: u16 = 402;
/// Access refused.
pub const ACCESS_REFUSED: u16 = 403;
/// Entity not found.
pub const NOT_FOUND: u16 = 404;
/// Exclusive resource locked by another connection.
pub const RESOURCE_LOCKED: u16 = 405;
/// Precondition failed.
pub const PRECONDITION_FAILED: u16 = 406;
/// Malformed frame.
pub const FRAME_ERROR: u16 = 501;
/// Invalid field values in a method frame.
pub const SYNTAX_ERROR: u16 = 502;
/// Method not allowed in the current state.
pub const COMMAND_INVALID: u16 = 503;
/// Channel used before open or after close.
pub const CHANNEL_ERROR: u16 = 504;
/// Unexpected content frame.
pub const UNEXPECTED_FRAME: u16 = 505;
/// Server ran out of a resource.
pub const RESOURCE_ERROR: u16 = 506;
/// Operation not permitted.
pub const NOT_ALLOWED: u16 = 530;
/// Functionality not implemented by the server.
pub const NOT_IMPLEMENTED: u16 = 540;
/// Internal server error.
pub const INTERNAL_ERROR: u16 = 541;

/// Returns the symbolic name for a reply code, if it is a known one.
///
/// # Examples
///
/// ```
/// use broker_reconnect_core::reply_code;
///
/// assert_eq!(reply_code::name(320), Some("CONNECTION_FORCED"));
/// assert_eq!(reply_code::name(999), None);
/// ```
pub fn name(code: u16) -> Option<&'static str> {
    let name = match code {
        REPLY_SUCCESS => "REPLY_SUCCESS",
        CONTENT_TOO_LARGE => "CONTENT_TOO_LARGE",
        NO_ROUTE => "NO_ROUTE",
        NO_CONSUMERS => "NO_CONSUMERS",
        CONNECTION_FORCED => "CONNECTION_FORCED",
        INVALID_PATH => "INVALID_PATH",
        ACCESS_REFUSED => "ACCESS_REFUSED",
        NOT_FOUND => "NOT_FOUND",
        RESOURCE_LOCKED => "RESOURCE_LOCKED",
        PRECONDITION_FAILED => "PRECONDITION_FAILED",
        FRAME_ERROR => "FRAME_ERROR",
        SYNTAX_ERROR => "SYNTAX_ERROR",
        COMMAND_INVALID => "COMMAND_INVALID",
        CHANNEL_ERROR => "CHANNEL_ERROR",
        UNEXPECTED_FRAME => "UNEXPECTED_FRAME",
        RESOURCE_ERROR => "RESOURCE_ERROR",
        NOT_ALLOWED => "NOT_ALLOWED",
        NOT_IMPLEMENTED => "NOT_IMPLEMENTED",
        INTERNAL_ERROR => "INTERNAL_ERROR",
        _ => return None,
    };
    Some(name)
}

/// Returns `true` for codes the protocol classifies as hard (connection-level)
/// errors, after which the whole connection is unusable.
pub fn is_hard_error(code: u16) -> bool {
    matches!(
        code,
        CONNECTION_FORCED
            | INVALID_PATH
            | FRAME_ERROR
            | SYNTAX_ERROR
            | COMMAND_INVALID
            | CHANNEL_ERROR
            | UNEXPECTED_FRAME
            | RESOURCE_ERROR
            | NOT_ALLOWED
            | NOT_IMPLEMENTED
            | INTERNAL_ERROR
    )
}
