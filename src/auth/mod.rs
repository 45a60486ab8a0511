//! OAuth device-code flow against Yandex OAuth.

pub mod classify;
pub mod device_code;
pub mod expiry;
pub mod flow;
pub mod poller;
pub mod token;
pub mod transport;

pub use classify::{classify, ClassifiedError};
pub use device_code::{CodeRequest, CodesResponse, ConfirmationCodes};
pub use expiry::{compute_expiry, Clock, SystemClock};
pub use flow::{authorize, refresh, DeviceFlow};
pub use poller::{CancelReason, PollOutcome, TokenPoller};
pub use token::{Token, TokenErrorResponse, TokenResponse};
pub use transport::{DeviceAuthTransport, HttpTransport, TokenReply};
