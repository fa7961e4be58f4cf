//! Login State Machine
//!
//! The login loop expressed as an explicit finite-state machine with a pure
//! transition function, so the sequencing is testable without any real
//! transport: feed it a fake event stream and assert on the actions.
//!
//! The loop may revisit [`LoginEvent::HostAuthenticityPrompt`] and
//! [`LoginEvent::PasswordPrompt`] several times (host-key question followed
//! by a password prompt is the common case) before an operational prompt
//! ends the sequence.

/// State of the login sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    /// Still negotiating: banners, host-key question, password exchange
    Connecting,
    /// An operational prompt was observed; the session is in clish
    LoggedIn,
}

/// Observation made on the transport during login
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginEvent {
    /// "Are you sure you want to continue connecting" host-key question
    HostAuthenticityPrompt,
    /// A password prompt
    PasswordPrompt,
    /// A line ending in `>` or `#`
    OperationalPrompt,
    /// End-of-stream
    Eof,
    /// The login timeout elapsed
    TimedOut,
}

/// What the driver must do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginAction {
    /// Answer the host-key question affirmatively and keep waiting
    AnswerYes,
    /// Send the login password and keep waiting
    SendPassword,
    /// Login complete
    Complete,
    /// Abort with the given failure
    Abort(LoginFailure),
}

/// Terminal login failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailure {
    /// A password prompt appeared but no password was supplied
    PasswordRequired,
    /// The stream ended during login
    ConnectionClosed,
    /// No prompt appeared within the login timeout
    TimedOut,
}

/// Pure transition function: `(state, event) -> (state, action)`.
///
/// `has_password` is the only piece of context the decision needs; it is
/// passed in rather than stored so the function stays a pure table.
pub fn step(
    state: LoginState,
    event: LoginEvent,
    has_password: bool,
) -> (LoginState, LoginAction) {
    match (state, event) {
        (LoginState::Connecting, LoginEvent::HostAuthenticityPrompt) => {
            (LoginState::Connecting, LoginAction::AnswerYes)
        }
        (LoginState::Connecting, LoginEvent::PasswordPrompt) => {
            if has_password {
                (LoginState::Connecting, LoginAction::SendPassword)
            } else {
                (
                    LoginState::Connecting,
                    LoginAction::Abort(LoginFailure::PasswordRequired),
                )
            }
        }
        (LoginState::Connecting, LoginEvent::OperationalPrompt) => {
            (LoginState::LoggedIn, LoginAction::Complete)
        }
        (LoginState::Connecting, LoginEvent::Eof) => (
            LoginState::Connecting,
            LoginAction::Abort(LoginFailure::ConnectionClosed),
        ),
        (LoginState::Connecting, LoginEvent::TimedOut) => (
            LoginState::Connecting,
            LoginAction::Abort(LoginFailure::TimedOut),
        ),
        // Once logged in there is nothing left to decide.
        (LoginState::LoggedIn, _) => (LoginState::LoggedIn, LoginAction::Complete),
    }
}
