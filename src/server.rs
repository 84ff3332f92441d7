//! TCP front of the simulated terminal.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{Instrument, info, info_span, warn};

use crate::session::Session;
use crate::terminal::Terminal;

/// A listening terminal simulator.
pub struct Server {
    listener: TcpListener,
    terminal: Arc<Terminal>,
}

impl Server {
    /// Bind on every interface.
    ///
    /// Port 0 lets the system pick a free port, [`Server::local_addr`]
    /// reports which one.
    pub async fn bind(port: u16, terminal: Terminal) -> io::Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port)).await?;
        Ok(Server {
            listener,
            terminal: Arc::new(terminal),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept tills until the listener fails, one task per connection.
    pub async fn run(self) -> io::Result<()> {
        info!(addr = %self.local_addr()?, "terminal listening");
        loop {
            let (stream, peer) = self.listener.accept().await?;
            info!(%peer, "till connected");
            let session = Session::new(Arc::clone(&self.terminal));
            tokio::spawn(
                async move {
                    match session.run(stream).await {
                        Ok(()) => info!("session finished"),
                        Err(error) => warn!(%error, "session failed"),
                    }
                }
                .instrument(info_span!("session", %peer)),
            );
        }
    }
}
