use reqwest::StatusCode;
use std::fmt::Display;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ApiError {
    RequestError,        // Error occurred while making the request
    ResponseParseError,  // Error occurred while parsing the response body
    ResponseDataError,   // Missing or invalid data in an auth response
    MalformedResponse,   // Page is missing the expected items collection
    MetadataParse,       // Video metadata is missing or has a non-numeric view count
    NoAccessToken,       // No access token was found
    InvalidAccessToken,  // Invalid access token
    BrowserError,        // Error occurred while opening the browser
    CallbackError,       // Callback server closed without delivering a code
    InternalServerError, // Error occurred on the api server

    ResponseError400, // Error returned in the response
    ResponseError401, // Error returned in the response
    ResponseError403, // Error returned in the response
    ResponseError404, // Error returned in the response
    ResponseError409, // Error returned in the response
    ResponseError429, // Error returned in the response
    ResponseError500, // Error returned in the response
    ResponseError502, // Error returned in the response
    ResponseError503, // Error returned in the response
    ResponseError504, // Error returned in the response
}

impl Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let msg = match self {
            ApiError::RequestError => "Error occurred while making the request",
            ApiError::ResponseParseError => "Error occurred while parsing the response",
            ApiError::ResponseDataError => "Missing or invalid data in the response",
            ApiError::MalformedResponse => "Response is missing the expected items collection",
            ApiError::MetadataParse => "Video metadata is missing or not numeric",
            ApiError::NoAccessToken => "No access token was found",
            ApiError::InvalidAccessToken => "Invalid access token",
            ApiError::BrowserError => "Error occurred while opening the browser",
            ApiError::CallbackError => "No authorization code was received",
            ApiError::InternalServerError => "Error occurred on the api server",

            ApiError::ResponseError400 => "Bad request",
            ApiError::ResponseError401 => "Unauthorized request",
            ApiError::ResponseError403 => "Forbidden request",
            ApiError::ResponseError404 => "Resource not found",
            ApiError::ResponseError409 => "Conflicting request",
            ApiError::ResponseError429 => "Too many requests",
            ApiError::ResponseError500 => "Internal server error",
            ApiError::ResponseError502 => "Bad gateway",
            ApiError::ResponseError503 => "Service unavailable",
            ApiError::ResponseError504 => "Gateway timeout",
        };
        write!(f, "{}", msg)
    }
}

pub fn return_response_error(sc: StatusCode) -> ApiError {
    match sc {
        StatusCode::BAD_REQUEST => ApiError::ResponseError400,
        StatusCode::UNAUTHORIZED => ApiError::ResponseError401,
        StatusCode::FORBIDDEN => ApiError::ResponseError403,
        StatusCode::NOT_FOUND => ApiError::ResponseError404,
        StatusCode::CONFLICT => ApiError::ResponseError409,
        StatusCode::TOO_MANY_REQUESTS => ApiError::ResponseError429,
        StatusCode::INTERNAL_SERVER_ERROR => ApiError::ResponseError500,
        StatusCode::BAD_GATEWAY => ApiError::ResponseError502,
        StatusCode::SERVICE_UNAVAILABLE => ApiError::ResponseError503,
        StatusCode::GATEWAY_TIMEOUT => ApiError::ResponseError504,
        _ => ApiError::InternalServerError,
    }
}
