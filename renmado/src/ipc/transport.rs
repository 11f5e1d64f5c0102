//! Local endpoints: Unix domain sockets, or named pipes on Windows.

pub use imp::*;

#[cfg(unix)]
mod imp {
    use std::io;
    use std::path::PathBuf;

    use tokio::net::{UnixListener, UnixStream};

    pub const COMMAND_ENDPOINT: &str = "/tmp/renmado.sock";
    pub const EVENT_ENDPOINT: &str = "/tmp/renmado-events.sock";

    pub type ServerStream = UnixStream;
    pub type ClientStream = std::os::unix::net::UnixStream;

    pub struct Listener {
        inner: UnixListener,
        path: PathBuf,
    }

    impl Listener {
        /// Replaces a stale socket file left behind by a previous daemon.
        pub fn bind(endpoint: &str) -> io::Result<Self> {
            let path = PathBuf::from(endpoint);
            if path.exists() {
                std::fs::remove_file(&path)?;
            }
            let inner = UnixListener::bind(&path)?;
            Ok(Self { inner, path })
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

    pub fn connect(endpoint: &str) -> io::Result<ClientStream> {
        ClientStream::connect(endpoint)
    }
}

#[cfg(windows)]
mod imp {
    use std::fs::{File, OpenOptions};
    use std::io;

    use tokio::net::windows::named_pipe::{NamedPipeServer, ServerOptions};

    pub const COMMAND_ENDPOINT: &str = r"\\.\pipe\renmado";
    pub const EVENT_ENDPOINT: &str = r"\\.\pipe\renmado-events";

    pub type ServerStream = NamedPipeServer;
    pub type ClientStream = File;

    /// Always keeps one unconnected pipe instance open so clients never see
    /// the pipe missing between accepts.
    pub struct Listener {
        endpoint: String,
        next: NamedPipeServer,
    }

    impl Listener {
        pub fn bind(endpoint: &str) -> io::Result<Self> {
            let next = ServerOptions::new()
                .first_pipe_instance(true)
                .create(endpoint)?;
            Ok(Self {
                endpoint: endpoint.to_string(),
                next,
            })
        }

        pub async fn accept(&mut self) -> io::Result<ServerStream> {
            self.next.connect().await?;
            let fresh = ServerOptions::new().create(&self.endpoint)?;
            Ok(std::mem::replace(&mut self.next, fresh))
        }
    }

    pub fn connect(endpoint: &str) -> io::Result<ClientStream> {
        OpenOptions::new().read(true).write(true).open(endpoint)
    }
}
