//! The local channel: a unix domain socket, or a named pipe on Windows.
//!
//! Both sides see plain `AsyncRead + AsyncWrite` streams; everything
//! above this module is platform-independent.

use std::io;
use std::path::{Path, PathBuf};

#[cfg(unix)]
pub use unix::{connect, ClientStream, Listener, ServerStream};
#[cfg(windows)]
pub use windows::{connect, ClientStream, Listener, ServerStream};

/// True if a dial failure may clear up on retry (server not started yet,
/// or every pipe instance busy).
pub fn is_retryable(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused | io::ErrorKind::WouldBlock
    ) || is_pipe_busy(err)
}

#[cfg(windows)]
fn is_pipe_busy(err: &io::Error) -> bool {
    const ERROR_PIPE_BUSY: i32 = 231;
    err.raw_os_error() == Some(ERROR_PIPE_BUSY)
}

#[cfg(not(windows))]
fn is_pipe_busy(_err: &io::Error) -> bool {
    false
}

#[cfg(unix)]
mod unix {
    use super::*;
    use tokio::net::{UnixListener, UnixStream};
    use tracing::debug;

    pub type ServerStream = UnixStream;
    pub type ClientStream = UnixStream;

    /// A bound socket.  The socket file is removed on drop.
    pub struct Listener {
        inner: UnixListener,
        path: PathBuf,
    }

    impl Listener {
        /// Bind `path`, clearing a stale socket file left by a crashed
        /// server.  Fails with `AddrInUse` if a live server answers.
        pub async fn bind(path: &Path) -> io::Result<Self> {
            if path.exists() {
                if UnixStream::connect(path).await.is_ok() {
                    return Err(io::Error::new(
                        io::ErrorKind::AddrInUse,
                        format!("another vault is already serving {}", path.display()),
                    ));
                }
                debug!(path = %path.display(), "removing stale socket");
                std::fs::remove_file(path)?;
            }

            let inner = UnixListener::bind(path)?;
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
            }
            Ok(Self {
                inner,
                path: path.to_path_buf(),
            })
        }

        pub async fn accept(&mut self) -> io::Result<ServerStream> {
            let (stream, _addr) = self.inner.accept().await?;
            Ok(stream)
        }
    }

    impl Drop for Listener {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    pub async fn connect(path: &Path) -> io::Result<ClientStream> {
        UnixStream::connect(path).await
    }
}

#[cfg(windows)]
mod windows {
    use super::*;
    use tokio::net::windows::named_pipe::{
        ClientOptions, NamedPipeClient, NamedPipeServer, ServerOptions,
    };

    pub type ServerStream = NamedPipeServer;
    pub type ClientStream = NamedPipeClient;

    /// A named pipe that always has one instance waiting for the next
    /// client.
    pub struct Listener {
        name: PathBuf,
        next: NamedPipeServer,
    }

    impl Listener {
        pub async fn bind(path: &Path) -> io::Result<Self> {
            let next = ServerOptions::new()
                .first_pipe_instance(true)
                .create(path)?;
            Ok(Self {
                name: path.to_path_buf(),
                next,
            })
        }

        /// Wait for a client, then create the instance for the following
        /// client before handing this one back.
        pub async fn accept(&mut self) -> io::Result<ServerStream> {
            self.next.connect().await?;
            let following = ServerOptions::new().create(&self.name)?;
            Ok(std::mem::replace(&mut self.next, following))
        }
    }

    pub async fn connect(path: &Path) -> io::Result<ClientStream> {
        ClientOptions::new().open(path)
    }
}
