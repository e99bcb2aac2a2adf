pub mod dispatcher;
pub mod message;

pub use dispatcher::{HttpDispatcher, MessageDispatcher, NullDispatcher};
pub use message::{MessageContext, PasswordReset, PersonalizedMessage, Recipient};

#[cfg(test)]
pub use dispatcher::MockMessageDispatcher;
