//! Redirection Handling
//!
//! Virtual descriptor table plus the save/restore stack behind
//! `redirect()` / `pop_redir()`. Writes and reads from evaluator code all
//! resolve through the table: to a file in the virtual fs, to the capture
//! buffers standing in for the terminal, or to in-memory input
//! (here-documents, pipeline stages).
//!
//! `>` targets are truncated at install time, so a redirection alone has
//! the same observable effect it has in a real shell. Descriptor
//! duplications are resolved when installed; later changes to the source
//! descriptor do not affect the copy.

use std::collections::HashMap;

use crate::ast::types::{Redir, RedirTarget};
use crate::fs::Fs;
use crate::interpreter::errors::{EvalResult, ShellException};

/// Install on top of a new save-frame; `pop_redir` undoes it.
pub const REDIR_PUSH: u8 = 1;
/// Permanent install (forked children, `exec`): no frame is recorded.
pub const REDIR_KEEP: u8 = 2;
/// Reserved for in-process back-tick capture of builtin output.
pub const REDIR_BACKQ: u8 = 4;

/// What a virtual descriptor points at.
#[derive(Debug, Clone, PartialEq)]
pub enum FdTarget {
    File { path: String, read: bool, write: bool, append: bool },
    /// In-memory input: here-documents and pipe read ends.
    Input(String),
    /// The capture buffer standing in for the terminal's stdout.
    CaptureOut,
    /// The capture buffer standing in for the terminal's stderr.
    CaptureErr,
    Closed,
}

/// Result of resolving a descriptor through the table.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedFd {
    Target(FdTarget),
    /// Unredirected standard descriptors.
    BaseIn,
    BaseOut,
    BaseErr,
    /// Never opened.
    Bad,
}

/// Descriptor table with a stack of save-frames.
#[derive(Debug, Clone, Default)]
pub struct RedirStack {
    table: HashMap<i32, FdTarget>,
    saved: Vec<Vec<(i32, Option<FdTarget>)>>,
}

impl RedirStack {
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn resolve(&self, fd: i32) -> ResolvedFd {
        match self.table.get(&fd) {
            Some(t) => ResolvedFd::Target(t.clone()),
            None => match fd {
                0 => ResolvedFd::BaseIn,
                1 => ResolvedFd::BaseOut,
                2 => ResolvedFd::BaseErr,
                _ => ResolvedFd::Bad,
            },
        }
    }

    pub fn push_frame(&mut self) {
        self.saved.push(Vec::new());
    }

    /// Point `fd` at `target`, recording the prior binding in the top
    /// frame when one is open.
    pub fn set(&mut self, fd: i32, target: FdTarget, record: bool) {
        let prior = self.table.insert(fd, target);
        if record {
            if let Some(frame) = self.saved.last_mut() {
                frame.push((fd, prior));
                return;
            }
        }
        let _ = prior;
    }

    /// Undo the most recent pushed frame.
    pub fn pop_frame(&mut self) {
        if let Some(frame) = self.saved.pop() {
            for (fd, prior) in frame.into_iter().rev() {
                match prior {
                    Some(t) => {
                        self.table.insert(fd, t);
                    }
                    None => {
                        self.table.remove(&fd);
                    }
                }
            }
        }
    }

    /// Pop frames until the stack is back at `depth` (exception recovery).
    pub fn unwind_to(&mut self, depth: usize) {
        while self.saved.len() > depth {
            self.pop_frame();
        }
    }
}

/// Per-state I/O: the descriptor table plus the base streams it falls
/// back to.
#[derive(Debug, Clone)]
pub struct ShellIo {
    pub redir: RedirStack,
    pub stdout: String,
    pub stderr: String,
    pub stdin: String,
    next_fd: i32,
}

impl Default for ShellIo {
    fn default() -> Self {
        Self {
            redir: RedirStack::default(),
            stdout: String::new(),
            stderr: String::new(),
            stdin: String::new(),
            next_fd: 3,
        }
    }
}

impl ShellIo {
    /// The I/O context a forked child starts with: the parent's descriptor
    /// table and stdin, fresh capture buffers.
    pub fn child_view(&self) -> ShellIo {
        ShellIo {
            redir: self.redir.clone(),
            stdout: String::new(),
            stderr: String::new(),
            stdin: self.stdin.clone(),
            next_fd: self.next_fd,
        }
    }

    fn alloc_fd(&mut self) -> i32 {
        let fd = self.next_fd;
        self.next_fd += 1;
        fd
    }

    /// Create a pipe whose endpoints never collide with the standard
    /// descriptors: any end below 3 is relocated upward before use.
    pub fn sh_pipe(&mut self) -> (i32, i32) {
        let mut rfd = self.alloc_fd();
        let mut wfd = self.alloc_fd();
        while rfd < 3 {
            rfd = self.alloc_fd();
        }
        while wfd < 3 {
            wfd = self.alloc_fd();
        }
        (rfd, wfd)
    }
}

// =============================================================================
// Expanded redirections
// =============================================================================

/// A redirection after filename expansion, ready to install.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedRedir {
    pub fd: i32,
    pub action: RedirAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RedirAction {
    OpenFile { path: String, read: bool, write: bool, append: bool, clobber: bool },
    Dup { from: i32 },
    Close,
    HereDoc { content: String },
}

/// Install a redirection list. With `REDIR_PUSH` the prior bindings are
/// saved on a new frame first; an error partway leaves that frame in
/// place so the caller's recovery path can `pop_redir` it.
pub fn redirect(
    fs: &dyn Fs,
    io: &mut ShellIo,
    noclobber: bool,
    cwd: &str,
    redirs: &[ExpandedRedir],
    mode: u8,
) -> EvalResult {
    let push = mode & REDIR_PUSH != 0;
    if push {
        io.redir.push_frame();
    }
    for er in redirs {
        let target = prepare_target(fs, io, noclobber, cwd, er)?;
        io.redir.set(er.fd, target, push);
    }
    Ok(())
}

pub fn pop_redir(io: &mut ShellIo) {
    io.redir.pop_frame();
}

fn prepare_target(
    fs: &dyn Fs,
    io: &ShellIo,
    noclobber: bool,
    cwd: &str,
    er: &ExpandedRedir,
) -> EvalResult<FdTarget> {
    match &er.action {
        RedirAction::HereDoc { content } => Ok(FdTarget::Input(content.clone())),
        RedirAction::Close => Ok(FdTarget::Closed),
        RedirAction::Dup { from } => match io.redir.resolve(*from) {
            ResolvedFd::Target(FdTarget::Closed) | ResolvedFd::Bad => {
                Err(ShellException::error(format!("{}: Bad file descriptor", from)))
            }
            ResolvedFd::Target(t) => Ok(t),
            ResolvedFd::BaseIn => Ok(FdTarget::Input(io.stdin.clone())),
            ResolvedFd::BaseOut => Ok(FdTarget::CaptureOut),
            ResolvedFd::BaseErr => Ok(FdTarget::CaptureErr),
        },
        RedirAction::OpenFile { path, read, write, append, clobber } => {
            let path = crate::fs::resolve_path(cwd, path);
            if *read && !*write {
                // Probe now so a missing input file fails at install time.
                fs.read_file(&path)
                    .map_err(|e| ShellException::error(format!("cannot open {}: {}", path, e)))?;
                return Ok(FdTarget::File { path, read: true, write: false, append: false });
            }
            if *write && !*append {
                if noclobber && !*clobber && fs.exists(&path) && !*read {
                    return Err(ShellException::error(format!(
                        "cannot create {}: File exists",
                        path
                    )));
                }
                if !(*read && fs.exists(&path)) {
                    // `<>` keeps existing contents; `>` truncates.
                    fs.write_file(&path, "").map_err(|e| {
                        ShellException::error(format!("cannot create {}: {}", path, e))
                    })?;
                }
            }
            Ok(FdTarget::File { path, read: *read, write: *write, append: *append })
        }
    }
}

// =============================================================================
// Descriptor I/O
// =============================================================================

/// Write through the descriptor table.
pub fn write_fd(fs: &dyn Fs, io: &mut ShellIo, fd: i32, text: &str) -> EvalResult {
    if text.is_empty() {
        return Ok(());
    }
    match io.redir.resolve(fd) {
        ResolvedFd::BaseOut => {
            io.stdout.push_str(text);
            Ok(())
        }
        ResolvedFd::BaseErr => {
            io.stderr.push_str(text);
            Ok(())
        }
        ResolvedFd::Target(FdTarget::CaptureOut) => {
            io.stdout.push_str(text);
            Ok(())
        }
        ResolvedFd::Target(FdTarget::CaptureErr) => {
            io.stderr.push_str(text);
            Ok(())
        }
        ResolvedFd::Target(FdTarget::File { path, write: true, .. }) => fs
            .append_file(&path, text)
            .map_err(|e| ShellException::error(format!("{}: {}", path, e))),
        ResolvedFd::Target(FdTarget::File { .. })
        | ResolvedFd::Target(FdTarget::Input(_))
        | ResolvedFd::BaseIn
        | ResolvedFd::Target(FdTarget::Closed)
        | ResolvedFd::Bad => {
            Err(ShellException::error(format!("{}: Bad file descriptor", fd)))
        }
    }
}

/// Read the whole input available on a descriptor.
pub fn read_fd(fs: &dyn Fs, io: &ShellIo, fd: i32) -> EvalResult<String> {
    match io.redir.resolve(fd) {
        ResolvedFd::BaseIn => Ok(io.stdin.clone()),
        ResolvedFd::Target(FdTarget::Input(s)) => Ok(s),
        ResolvedFd::Target(FdTarget::File { path, read: true, .. }) => fs
            .read_file(&path)
            .map_err(|e| ShellException::error(format!("{}: {}", path, e))),
        _ => Err(ShellException::error(format!("{}: Bad file descriptor", fd))),
    }
}

// =============================================================================
// Redirection expansion
// =============================================================================

impl crate::interpreter::execution_engine::Evaluator<'_> {
    /// Compute the targets of a redirection list: filenames and
    /// here-document bodies are expanded, descriptor-duplication targets
    /// are validated.
    pub fn expredir(
        &self,
        state: &mut crate::interpreter::types::ShellState,
        redirs: &[Redir],
    ) -> EvalResult<Vec<ExpandedRedir>> {
        use crate::ast::types::RedirKind;
        use crate::interpreter::word_expansion::{expand_to_field, EXP_REDIR, EXP_TILDE};

        let mut out = Vec::with_capacity(redirs.len());
        for redir in redirs {
            state.line_number = redir.lineno;
            let fd = redir.io_fd();
            let action = match (&redir.kind, &redir.target) {
                (RedirKind::HereDoc, RedirTarget::HereDoc { content, .. }) => {
                    let content = expand_to_field(self, state, content, EXP_REDIR)?;
                    RedirAction::HereDoc { content }
                }
                (RedirKind::FromFd | RedirKind::ToFd, RedirTarget::Word(word)) => {
                    let target = expand_to_field(self, state, word, EXP_TILDE | EXP_REDIR)?;
                    if target == "-" {
                        RedirAction::Close
                    } else {
                        match target.parse::<i32>() {
                            Ok(from) => RedirAction::Dup { from },
                            Err(_) => {
                                return Err(ShellException::error(format!(
                                    "Bad fd number: {}",
                                    target
                                )))
                            }
                        }
                    }
                }
                (kind, RedirTarget::Word(word)) => {
                    let path = expand_to_field(self, state, word, EXP_TILDE | EXP_REDIR)?;
                    let (read, write, append, clobber) = match kind {
                        RedirKind::From => (true, false, false, false),
                        RedirKind::FromTo => (true, true, false, false),
                        RedirKind::To => (false, true, false, false),
                        RedirKind::Clobber => (false, true, false, true),
                        RedirKind::Append => (false, true, true, false),
                        _ => (false, true, false, false),
                    };
                    RedirAction::OpenFile { path, read, write, append, clobber }
                }
                (_, RedirTarget::HereDoc { content, .. }) => {
                    let content = expand_to_field(self, state, content, EXP_REDIR)?;
                    RedirAction::HereDoc { content }
                }
            };
            out.push(ExpandedRedir { fd, action });
        }
        Ok(out)
    }
}

/// Render a redirection for `-x` trace output.
pub fn format_redir(redir: &Redir) -> String {
    let mut out = String::new();
    if let Some(fd) = redir.fd {
        out.push_str(&fd.to_string());
    }
    out.push_str(redir.kind.as_str());
    match &redir.target {
        RedirTarget::Word(w) => out.push_str(&w.display_text()),
        RedirTarget::HereDoc { .. } => out.push_str("..."),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemFs;

    fn setup() -> (MemFs, ShellIo) {
        (MemFs::new(), ShellIo::default())
    }

    #[test]
    fn test_write_to_base_buffers() {
        let (fs, mut io) = setup();
        write_fd(&fs, &mut io, 1, "out").unwrap();
        write_fd(&fs, &mut io, 2, "err").unwrap();
        assert_eq!(io.stdout, "out");
        assert_eq!(io.stderr, "err");
    }

    #[test]
    fn test_redirect_truncates_at_install() {
        let (fs, mut io) = setup();
        fs.add_file("/f", "old contents");
        let redirs = vec![ExpandedRedir {
            fd: 1,
            action: RedirAction::OpenFile {
                path: "/f".into(),
                read: false,
                write: true,
                append: false,
                clobber: false,
            },
        }];
        redirect(&fs, &mut io, false, "/", &redirs, REDIR_PUSH).unwrap();
        assert_eq!(fs.read_file("/f").unwrap(), "");
        write_fd(&fs, &mut io, 1, "new").unwrap();
        assert_eq!(fs.read_file("/f").unwrap(), "new");
        assert!(io.stdout.is_empty());
        pop_redir(&mut io);
        write_fd(&fs, &mut io, 1, "after").unwrap();
        assert_eq!(io.stdout, "after");
        assert_eq!(fs.read_file("/f").unwrap(), "new");
    }

    #[test]
    fn test_append_keeps_contents() {
        let (fs, mut io) = setup();
        fs.add_file("/log", "a");
        let redirs = vec![ExpandedRedir {
            fd: 1,
            action: RedirAction::OpenFile {
                path: "/log".into(),
                read: false,
                write: true,
                append: true,
                clobber: false,
            },
        }];
        redirect(&fs, &mut io, false, "/", &redirs, REDIR_PUSH).unwrap();
        write_fd(&fs, &mut io, 1, "b").unwrap();
        assert_eq!(fs.read_file("/log").unwrap(), "ab");
    }

    #[test]
    fn test_dup_resolves_at_install() {
        let (fs, mut io) = setup();
        fs.add_file("/f", "");
        let redirs = vec![
            ExpandedRedir {
                fd: 1,
                action: RedirAction::OpenFile {
                    path: "/f".into(),
                    read: false,
                    write: true,
                    append: false,
                    clobber: false,
                },
            },
            ExpandedRedir { fd: 2, action: RedirAction::Dup { from: 1 } },
        ];
        redirect(&fs, &mut io, false, "/", &redirs, REDIR_PUSH).unwrap();
        write_fd(&fs, &mut io, 2, "to-file").unwrap();
        assert_eq!(fs.read_file("/f").unwrap(), "to-file");
    }

    #[test]
    fn test_dup_of_closed_fd_is_error() {
        let (fs, mut io) = setup();
        let redirs = vec![ExpandedRedir { fd: 1, action: RedirAction::Dup { from: 7 } }];
        assert!(redirect(&fs, &mut io, false, "/", &redirs, REDIR_PUSH).is_err());
    }

    #[test]
    fn test_missing_input_file_fails_at_install() {
        let (fs, mut io) = setup();
        let redirs = vec![ExpandedRedir {
            fd: 0,
            action: RedirAction::OpenFile {
                path: "/nope".into(),
                read: true,
                write: false,
                append: false,
                clobber: false,
            },
        }];
        assert!(redirect(&fs, &mut io, false, "/", &redirs, REDIR_PUSH).is_err());
        // The failed install still left a frame to pop.
        assert_eq!(io.redir.depth(), 1);
        pop_redir(&mut io);
        assert_eq!(io.redir.depth(), 0);
    }

    #[test]
    fn test_noclobber() {
        let (fs, mut io) = setup();
        fs.add_file("/f", "keep");
        let open = |clobber| {
            vec![ExpandedRedir {
                fd: 1,
                action: RedirAction::OpenFile {
                    path: "/f".into(),
                    read: false,
                    write: true,
                    append: false,
                    clobber,
                },
            }]
        };
        assert!(redirect(&fs, &mut io, true, "/", &open(false), REDIR_PUSH).is_err());
        assert_eq!(fs.read_file("/f").unwrap(), "keep");
        assert!(redirect(&fs, &mut io, true, "/", &open(true), REDIR_PUSH).is_ok());
        assert_eq!(fs.read_file("/f").unwrap(), "");
    }

    #[test]
    fn test_heredoc_read() {
        let (fs, mut io) = setup();
        let redirs = vec![ExpandedRedir {
            fd: 0,
            action: RedirAction::HereDoc { content: "body\n".into() },
        }];
        redirect(&fs, &mut io, false, "/", &redirs, REDIR_PUSH).unwrap();
        assert_eq!(read_fd(&fs, &io, 0).unwrap(), "body\n");
    }

    #[test]
    fn test_nested_frames_restore_in_order() {
        let (fs, mut io) = setup();
        fs.add_file("/a", "");
        fs.add_file("/b", "");
        let open = |p: &str| {
            vec![ExpandedRedir {
                fd: 1,
                action: RedirAction::OpenFile {
                    path: p.into(),
                    read: false,
                    write: true,
                    append: false,
                    clobber: false,
                },
            }]
        };
        redirect(&fs, &mut io, false, "/", &open("/a"), REDIR_PUSH).unwrap();
        redirect(&fs, &mut io, false, "/", &open("/b"), REDIR_PUSH).unwrap();
        write_fd(&fs, &mut io, 1, "x").unwrap();
        assert_eq!(fs.read_file("/b").unwrap(), "x");
        pop_redir(&mut io);
        write_fd(&fs, &mut io, 1, "y").unwrap();
        assert_eq!(fs.read_file("/a").unwrap(), "y");
        pop_redir(&mut io);
        assert_eq!(io.redir.depth(), 0);
    }

    #[test]
    fn test_keep_mode_survives_pop() {
        let (fs, mut io) = setup();
        fs.add_file("/f", "");
        let redirs = vec![ExpandedRedir {
            fd: 1,
            action: RedirAction::OpenFile {
                path: "/f".into(),
                read: false,
                write: true,
                append: false,
                clobber: false,
            },
        }];
        redirect(&fs, &mut io, false, "/", &redirs, REDIR_KEEP).unwrap();
        assert_eq!(io.redir.depth(), 0);
        write_fd(&fs, &mut io, 1, "kept").unwrap();
        assert_eq!(fs.read_file("/f").unwrap(), "kept");
    }

    #[test]
    fn test_sh_pipe_fds_at_least_three() {
        let mut io = ShellIo::default();
        let (r, w) = io.sh_pipe();
        assert!(r >= 3 && w >= 3);
        assert_ne!(r, w);
    }
}
