use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use std::fmt;
use std::io::Cursor;

#[derive(Debug, Clone)]
pub enum Error {
    /// Transport failure or non-2xx status from the device.
    DeviceUnreachable(String),
    /// Response body and the reason it was rejected.
    InvalidResponse(String, String),
    /// Field code absent from the response.
    MissingField(u64),
    /// Timestamp value and the reason it was rejected.
    TimestampParse(String, String),
    InvalidTimezone(String),
    FormatError,
    InternalError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DeviceUnreachable(s) => write!(f, "device unreachable: {}", s),
            Error::InvalidResponse(body, reason) => {
                write!(f, "invalid device response ({}): {}", reason, body)
            }
            Error::MissingField(code) => write!(f, "field {} missing from device response", code),
            Error::TimestampParse(value, reason) => {
                write!(f, "unable to parse timestamp '{}': {}", value, reason)
            }
            Error::InvalidTimezone(s) => write!(f, "invalid timezone '{}'", s),
            Error::FormatError => write!(f, "unable to format metrics"),
            Error::InternalError => write!(f, "internal error"),
        }
    }
}

impl std::error::Error for Error {}

fn text_response(status: Status, error: String) -> response::Result<'static> {
    Response::build()
        .status(status)
        .sized_body(error.len(), Cursor::new(error))
        .header(ContentType::Plain)
        .ok()
}

/* Plain text: error details carry raw device output */
impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        match self {
            Error::DeviceUnreachable(ref s) => {
                let error = format!("502 Bad Gateway\nSolar-Log device unreachable: {}\n", s);
                text_response(Status::BadGateway, error)
            }
            Error::InvalidResponse(..) | Error::MissingField(_) | Error::TimestampParse(..) => {
                let error = format!("502 Bad Gateway\nUnexpected Solar-Log response: {}\n", self);
                text_response(Status::BadGateway, error)
            }
            _ => {
                let error = format!("500 Internal Server Error\n{}\n", self);
                text_response(Status::InternalServerError, error)
            }
        }
    }
}
