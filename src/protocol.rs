//! The wire codec: pure functions that turn client commands into protocol
//! lines and classify single server lines into typed events. No I/O and no
//! state live here.
//!
//! Server lines are matched by keyword and substring rather than a strict
//! grammar, in the order the server variants are known to emit them. A line
//! that merely contains one of the keywords anywhere is classified by it;
//! real servers never produce such lines, so the looseness is kept instead
//! of tightening the grammar and diverging from observed server behavior.

/// Characters the server rejects in usernames.
const FORBIDDEN_CHARS: &[char] = &['!', '@', '#', '$', '%', '^', '&', '*', ' '];

/// True when `candidate` can be offered to the server as a login name:
/// non-empty and free of forbidden characters.
pub fn is_valid_username(candidate: &str) -> bool {
    !candidate.is_empty() && !candidate.contains(FORBIDDEN_CHARS)
}

/// A command the client can send, encoded to one protocol line before write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Login { username: String },
    ListUsers,
    Send { target: String, body: String },
}

impl ClientCommand {
    /// Serializes the command into its newline-terminated wire form.
    ///
    /// Callers validate the username before `Login` and make sure the
    /// `Send` target contains no spaces; the body is taken verbatim.
    pub fn to_line(&self) -> String {
        match self {
            ClientCommand::Login { username } => format!("HELLO-FROM {username}\n"),
            ClientCommand::ListUsers => "LIST\n".to_string(),
            ClientCommand::Send { target, body } => format!("SEND {target} {body}\n"),
        }
    }
}

/// A server line received while the chat session is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    SendAck,
    NoSuchUser,
    Delivery { from: String, body: String },
    UserList { users: Vec<String> },
    ServerBusy,
    BadRequestHeader,
    BadRequestBody,
    Unknown { raw: String },
}

impl ServerEvent {
    /// Classifies one server line; `None` means the line produces no event
    /// (blank, or a `DELIVERY` missing its sender or body).
    pub fn decode(line: &str) -> Option<ServerEvent> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if line == "SEND-OK" {
            return Some(ServerEvent::SendAck);
        }
        if line == "BAD-DEST-USER" {
            return Some(ServerEvent::NoSuchUser);
        }
        if line.contains("DELIVERY") {
            let mut fields = line.splitn(3, ' ');
            let _header = fields.next()?;
            let from = fields.next()?;
            let body = fields.next()?;
            return Some(ServerEvent::Delivery {
                from: from.to_string(),
                body: body.to_string(),
            });
        }
        if line.contains("LIST-OK") {
            // The online users arrive as whitespace-separated groups of
            // comma-joined names; empty tokens are dropped, order is kept.
            let users = line
                .split_whitespace()
                .skip(1)
                .flat_map(|group| group.split(','))
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
            return Some(ServerEvent::UserList { users });
        }
        if line == "BUSY" {
            return Some(ServerEvent::ServerBusy);
        }
        if line == "BAD-RQST-HDR" {
            return Some(ServerEvent::BadRequestHeader);
        }
        // One known server variant spells the body error without the O.
        if line == "BAD-RQST-BODY" || line == "BAD-RQST-BDY" {
            return Some(ServerEvent::BadRequestBody);
        }
        Some(ServerEvent::Unknown {
            raw: line.to_string(),
        })
    }
}

/// The server's answer to a `HELLO-FROM` login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginReply {
    Accepted,
    NameInUse,
    ServerFull,
    Rejected,
    Unrecognized,
}

impl LoginReply {
    /// Classifies the greeting line the server sends back after a login
    /// attempt. Substring match, first hit wins.
    pub fn classify(line: &str) -> LoginReply {
        if line.contains("HELLO") {
            LoginReply::Accepted
        } else if line.contains("IN-USE") {
            LoginReply::NameInUse
        } else if line.contains("BUSY") {
            LoginReply::ServerFull
        } else if line.contains("BAD") {
            LoginReply::Rejected
        } else {
            LoginReply::Unrecognized
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_with_forbidden_characters_are_rejected() {
        for bad in ["al!ce", "@bob", "ca#rol", "d$ve", "e%ve", "fr^nk", "gr&ce", "he*di", "two words"] {
            assert!(!is_valid_username(bad), "{bad:?} should be rejected");
        }
        assert!(!is_valid_username(""));
    }

    #[test]
    fn plain_usernames_are_accepted() {
        for good in ["alice", "bob-42", "carol_x", "Δelta"] {
            assert!(is_valid_username(good), "{good:?} should be accepted");
        }
    }

    #[test]
    fn commands_encode_to_newline_terminated_lines() {
        let login = ClientCommand::Login {
            username: "alice".into(),
        };
        assert_eq!(login.to_line(), "HELLO-FROM alice\n");
        assert_eq!(ClientCommand::ListUsers.to_line(), "LIST\n");

        let send = ClientCommand::Send {
            target: "bob".into(),
            body: "hello over there".into(),
        };
        assert_eq!(send.to_line(), "SEND bob hello over there\n");
    }

    #[test]
    fn send_ok_and_busy_are_exact_matches() {
        assert_eq!(ServerEvent::decode("SEND-OK"), Some(ServerEvent::SendAck));
        assert_eq!(ServerEvent::decode("BUSY"), Some(ServerEvent::ServerBusy));
        assert_eq!(
            ServerEvent::decode("BAD-DEST-USER"),
            Some(ServerEvent::NoSuchUser)
        );
    }

    #[test]
    fn delivery_keeps_the_body_verbatim() {
        assert_eq!(
            ServerEvent::decode("DELIVERY alice hello world"),
            Some(ServerEvent::Delivery {
                from: "alice".into(),
                body: "hello world".into(),
            })
        );
    }

    #[test]
    fn delivery_without_a_body_is_dropped() {
        assert_eq!(ServerEvent::decode("DELIVERY alice"), None);
        assert_eq!(ServerEvent::decode("DELIVERY"), None);
    }

    #[test]
    fn user_list_splits_comma_joined_groups() {
        assert_eq!(
            ServerEvent::decode("LIST-OK alice,bob"),
            Some(ServerEvent::UserList {
                users: vec!["alice".into(), "bob".into()],
            })
        );
        assert_eq!(
            ServerEvent::decode("LIST-OK alice,bob carol"),
            Some(ServerEvent::UserList {
                users: vec!["alice".into(), "bob".into(), "carol".into()],
            })
        );
    }

    #[test]
    fn user_list_drops_empty_tokens() {
        assert_eq!(
            ServerEvent::decode("LIST-OK alice,,bob,"),
            Some(ServerEvent::UserList {
                users: vec!["alice".into(), "bob".into()],
            })
        );
        assert_eq!(
            ServerEvent::decode("LIST-OK "),
            Some(ServerEvent::UserList { users: vec![] })
        );
    }

    #[test]
    fn both_bad_body_spellings_are_accepted() {
        assert_eq!(
            ServerEvent::decode("BAD-RQST-BODY"),
            Some(ServerEvent::BadRequestBody)
        );
        assert_eq!(
            ServerEvent::decode("BAD-RQST-BDY"),
            Some(ServerEvent::BadRequestBody)
        );
        assert_eq!(
            ServerEvent::decode("BAD-RQST-HDR"),
            Some(ServerEvent::BadRequestHeader)
        );
    }

    #[test]
    fn blank_lines_produce_no_event() {
        assert_eq!(ServerEvent::decode(""), None);
        assert_eq!(ServerEvent::decode("   "), None);
    }

    #[test]
    fn unrecognized_lines_keep_their_raw_text() {
        assert_eq!(
            ServerEvent::decode("WAT is this"),
            Some(ServerEvent::Unknown {
                raw: "WAT is this".into(),
            })
        );
    }

    #[test]
    fn classification_is_by_substring_in_declared_order() {
        // Keyword anywhere in the line wins, earlier checks first. The
        // looseness is deliberate; see the module docs.
        assert_eq!(
            ServerEvent::decode("XDELIVERYX bob hi"),
            Some(ServerEvent::Delivery {
                from: "bob".into(),
                body: "hi".into(),
            })
        );
    }

    #[test]
    fn login_replies_classify_by_substring() {
        assert_eq!(LoginReply::classify("HELLO alice"), LoginReply::Accepted);
        assert_eq!(LoginReply::classify("IN-USE"), LoginReply::NameInUse);
        assert_eq!(LoginReply::classify("BUSY"), LoginReply::ServerFull);
        assert_eq!(LoginReply::classify("BAD-RQST-HDR"), LoginReply::Rejected);
        assert_eq!(LoginReply::classify("BAD-RQST-BDY"), LoginReply::Rejected);
        assert_eq!(LoginReply::classify("???"), LoginReply::Unrecognized);
    }

    #[test]
    fn login_reply_order_prefers_hello() {
        // A greeting containing several keywords resolves to the first
        // checked one.
        assert_eq!(LoginReply::classify("HELLO BUSY"), LoginReply::Accepted);
    }
}
