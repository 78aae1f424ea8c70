//! Per-connection session state: current group/article pointers,
//! authentication state, and the active capability set.

use crate::wire::ArticleNumber;
use std::collections::HashSet;

/// A named group of command handlers, as advertised by CAPABILITIES
/// and enforced by the dispatcher (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// CAPABILITIES, MODE, QUIT, HELP, DATE, AUTHINFO — always active.
    Mandatory,
    /// GROUP, LISTGROUP, LAST, NEXT, ARTICLE, HEAD, BODY, STAT, HDR, XPAT.
    Reader,
    /// LIST and its sub-commands.
    List,
    /// NEWGROUPS, NEWNEWS.
    NewNews,
    /// OVER, XOVER.
    Over,
    /// POST.
    Post,
    /// IHAVE — transit-only, removed by MODE READER.
    Ihave,
}

impl Capability {
    /// The capability keyword used in the CAPABILITIES response body.
    pub fn label(self) -> &'static str {
        match self {
            Capability::Mandatory => "MANDATORY",
            Capability::Reader => "READER",
            Capability::List => "LIST",
            Capability::NewNews => "NEWNEWS",
            Capability::Over => "OVER MSGID",
            Capability::Post => "POST",
            Capability::Ihave => "IHAVE",
        }
    }

    /// Whether this capability is printed on its own in the
    /// CAPABILITIES listing. `Mandatory` is implied by `VERSION` and
    /// is not repeated.
    pub fn advertised(self) -> bool {
        !matches!(self, Capability::Mandatory)
    }

    fn all() -> [Capability; 7] {
        [
            Capability::Mandatory,
            Capability::Reader,
            Capability::List,
            Capability::NewNews,
            Capability::Over,
            Capability::Post,
            Capability::Ihave,
        ]
    }

    /// The capability set `MODE READER` reduces a session to: every
    /// capability except transit-only IHAVE.
    fn reader_mode_set() -> HashSet<Capability> {
        Self::all().into_iter().filter(|c| *c != Capability::Ihave).collect()
    }
}

/// Per-connection session state, owned exclusively by the engine.
pub struct SessionState {
    current_group: Option<String>,
    current_article: Option<ArticleNumber>,
    auth_token: Option<String>,
    /// The authenticated subject name, once AUTHINFO succeeds; this is
    /// what is passed to the policy service as the submitter identity.
    subject: Option<String>,
    pending_user: Option<String>,
    active: HashSet<Capability>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            current_group: None,
            current_article: None,
            auth_token: None,
            subject: None,
            pending_user: None,
            active: Capability::all().into_iter().collect(),
        }
    }

    pub fn current_group(&self) -> Option<&str> {
        self.current_group.as_deref()
    }

    pub fn current_article(&self) -> Option<ArticleNumber> {
        self.current_article
    }

    /// Select a group, resetting the current article to its first
    /// article (or clearing it if the group is empty), per §3.
    pub fn select_group(&mut self, group: String, first_article: Option<ArticleNumber>) {
        self.current_group = Some(group);
        self.current_article = first_article;
    }

    pub fn leave_group(&mut self) {
        self.current_group = None;
        self.current_article = None;
    }

    pub fn set_current_article(&mut self, num: ArticleNumber) {
        self.current_article = Some(num);
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_token.is_some()
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub fn set_auth_token(&mut self, subject: String, token: String) {
        self.auth_token = Some(token);
        self.subject = Some(subject);
        self.pending_user = None;
    }

    /// The authenticated submitter identity, if AUTHINFO has succeeded.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn pending_user(&self) -> Option<&str> {
        self.pending_user.as_deref()
    }

    /// Set the pending username, replacing any previous one, as
    /// AUTHINFO USER does unconditionally (§4.12).
    pub fn set_pending_user(&mut self, username: String) {
        self.pending_user = Some(username);
    }

    pub fn clear_pending_user(&mut self) {
        self.pending_user = None;
    }

    /// Reduce the active capability set to the `MODE READER` union.
    pub fn enter_reader_mode(&mut self) {
        self.active = Capability::reader_mode_set();
    }

    pub fn is_active(&self, capability: Capability) -> bool {
        self.active.contains(&capability)
    }

    /// Capabilities to advertise via CAPABILITIES, in a stable order.
    pub fn active_capabilities(&self) -> Vec<Capability> {
        Capability::all()
            .into_iter()
            .filter(|c| c.advertised() && self.active.contains(c))
            .collect()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_has_no_group_or_article() {
        let s = SessionState::new();
        assert!(s.current_group().is_none());
        assert!(s.current_article().is_none());
    }

    #[test]
    fn select_group_resets_current_article() {
        let mut s = SessionState::new();
        s.set_current_article(42);
        s.select_group("g".into(), Some(1));
        assert_eq!(s.current_article(), Some(1));
        s.select_group("empty".into(), None);
        assert_eq!(s.current_article(), None);
    }

    #[test]
    fn leave_group_clears_both() {
        let mut s = SessionState::new();
        s.select_group("g".into(), Some(3));
        s.leave_group();
        assert!(s.current_group().is_none());
        assert!(s.current_article().is_none());
    }

    #[test]
    fn reader_mode_drops_ihave_but_keeps_post() {
        let mut s = SessionState::new();
        assert!(s.is_active(Capability::Ihave));
        s.enter_reader_mode();
        assert!(!s.is_active(Capability::Ihave));
        assert!(s.is_active(Capability::Post));
        assert!(s.is_active(Capability::Reader));
        assert!(s.is_active(Capability::List));
        assert!(s.is_active(Capability::NewNews));
        assert!(s.is_active(Capability::Over));
    }

    #[test]
    fn pending_user_flow() {
        let mut s = SessionState::new();
        s.set_pending_user("alice".into());
        assert_eq!(s.pending_user(), Some("alice"));
        s.set_auth_token("alice".into(), "tok".into());
        assert!(s.pending_user().is_none());
        assert!(s.is_authenticated());
        assert_eq!(s.subject(), Some("alice"));
    }
}
