//! Raw IRC line parsing.
//!
//! Handles the `[@tags] [:prefix] COMMAND param... [:trailing]` grammar,
//! e.g. `:katt!katt@172.17.0.1 PRIVMSG #boing :riiinky dinky`.

/// A single parsed protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcLine {
    /// Source prefix without the leading colon (`nick!user@host` or a server name).
    pub prefix: Option<String>,
    /// Command or three-digit numeric, uppercased.
    pub command: String,
    /// Middle parameters followed by the trailing parameter, if any.
    pub params: Vec<String>,
}

impl IrcLine {
    /// Parse a raw line. Returns `None` for blank lines or lines without a command.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut rest = raw.trim_end_matches(['\r', '\n']);

        // IRCv3 message tags are not used by the bot.
        if rest.starts_with('@') {
            rest = rest.split_once(' ').map(|(_, r)| r)?;
        }
        rest = rest.trim_start_matches(' ');

        let prefix = if let Some(stripped) = rest.strip_prefix(':') {
            let (prefix, r) = stripped.split_once(' ')?;
            rest = r;
            Some(prefix.to_string())
        } else {
            None
        };

        rest = rest.trim_start_matches(' ');
        let (command, mut rest) = match rest.split_once(' ') {
            Some((c, r)) => (c, r),
            None => (rest, ""),
        };
        if command.is_empty() {
            return None;
        }

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            match rest.split_once(' ') {
                Some((p, r)) => {
                    params.push(p.to_string());
                    rest = r;
                }
                None => {
                    params.push(rest.to_string());
                    break;
                }
            }
        }

        Some(Self {
            prefix,
            command: command.to_ascii_uppercase(),
            params,
        })
    }

    /// Nickname part of the prefix (`katt` in `katt!katt@host`).
    pub fn nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        let nick = prefix.split(['!', '@']).next().unwrap_or(prefix);
        if nick.is_empty() {
            None
        } else {
            Some(nick)
        }
    }

    /// The last parameter, which carries the free-form text of most commands.
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }
}

/// Whether `target` names a channel rather than a nick.
pub fn is_channel_name(target: &str) -> bool {
    target.starts_with(['#', '&', '+', '!'])
}

/// Channel named in an `INVITE` line (`:nick!u@h INVITE bot :#chan`).
pub fn invite_channel(raw: &str) -> Option<String> {
    let line = IrcLine::parse(raw)?;
    if line.command != "INVITE" {
        return None;
    }
    line.trailing()
        .filter(|c| !c.is_empty())
        .map(ToString::to_string)
}
