use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use error_stack::Report;
use error_stack::ResultExt;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncRead;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tracing::debug;
use tracing::instrument;

use super::error::NutError;
use super::protocol;
use crate::domain::traits::TelemetrySource;
use crate::domain::types::TelemetrySnapshot;

/// Port `upsd` listens on unless told otherwise.
pub const DEFAULT_NUT_PORT: u16 = 3493;

const VAR_STATUS: &str = "ups.status";
const VAR_BATTERY_CHARGE: &str = "battery.charge";

/// Client for the NUT `upsd` network protocol.
///
/// Every request, including reading a full `LIST` block, must complete within
/// the configured timeout.
pub struct NutClient<S> {
    stream: BufReader<S>,
    timeout: Duration,
}

impl NutClient<TcpStream> {
    /// Connect to `address`, given as `host` or `host:port`.
    #[instrument(skip(timeout))]
    pub async fn connect(
        address: &str,
        timeout: Duration,
    ) -> Result<Self, Report<NutError>> {
        let address = with_default_port(address);
        let stream = tokio::time::timeout(timeout, TcpStream::connect(&address))
            .await
            .map_err(|_| {
                Report::new(NutError::Timeout {
                    seconds: timeout.as_secs(),
                })
            })
            .attach_printable_lazy(|| format!("connecting to {address}"))?
            .change_context(NutError::Connect {
                address: address.clone(),
            })?;

        debug!(address = %address, "connected to NUT server");
        Ok(Self::new(stream, timeout))
    }
}

impl<S> NutClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S, timeout: Duration) -> Self {
        Self {
            stream: BufReader::new(stream),
            timeout,
        }
    }

    /// Log in with `USERNAME` and `PASSWORD`.
    ///
    /// # Errors
    ///
    /// - [`NutError::Server`] if the server rejects the credentials
    pub async fn authenticate(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<(), Report<NutError>> {
        self.expect_ok(&format!("USERNAME {}", protocol::quote(username)))
            .await?;
        self.expect_ok(&format!("PASSWORD {}", protocol::quote(password)))
            .await
    }

    /// Names of all UPS devices served by `upsd`.
    pub async fn list_ups(&mut self) -> Result<Vec<String>, Report<NutError>> {
        let entries = self.list("UPS").await?;
        Ok(entries
            .iter()
            .filter_map(|words| protocol::parse_ups_entry(words))
            .collect())
    }

    /// All variables of `ups`, by name.
    pub async fn list_vars(
        &mut self,
        ups: &str,
    ) -> Result<BTreeMap<String, String>, Report<NutError>> {
        let entries = self.list(&format!("VAR {}", protocol::quote(ups))).await?;
        Ok(entries
            .iter()
            .filter_map(|words| protocol::parse_var_entry(words, ups))
            .collect())
    }

    /// Say goodbye; the server closes the connection afterwards.
    pub async fn logout(&mut self) -> Result<(), Report<NutError>> {
        let words = self.request("LOGOUT").await?;
        match words.first().map(String::as_str) {
            Some("OK") => Ok(()),
            _ => Err(Report::new(NutError::Protocol {
                message: format!("unexpected logout response {words:?}"),
            })),
        }
    }

    async fn expect_ok(&mut self, command: &str) -> Result<(), Report<NutError>> {
        let words = self.request(command).await?;
        if words.first().map(String::as_str) == Some("OK") {
            Ok(())
        } else {
            Err(Report::new(NutError::Protocol {
                message: format!("expected OK, got {words:?}"),
            }))
        }
    }

    /// Send one command and read its single line response.
    async fn request(&mut self, command: &str) -> Result<Vec<String>, Report<NutError>> {
        with_timeout(self.timeout, self.request_unbounded(command)).await
    }

    /// Run `LIST <query>` and collect the lines between `BEGIN` and `END`.
    async fn list(&mut self, query: &str) -> Result<Vec<Vec<String>>, Report<NutError>> {
        with_timeout(self.timeout, self.list_unbounded(query))
            .await
            .attach_printable_lazy(|| format!("LIST {query}"))
    }

    async fn request_unbounded(&mut self, command: &str) -> Result<Vec<String>, Report<NutError>> {
        self.send(command).await?;
        let words = protocol::tokenize(&self.read_line().await?)?;
        protocol::check_error(&words)?;
        Ok(words)
    }

    async fn list_unbounded(&mut self, query: &str) -> Result<Vec<Vec<String>>, Report<NutError>> {
        let begin = self.request_unbounded(&format!("LIST {query}")).await?;
        if begin.first().map(String::as_str) != Some("BEGIN") {
            return Err(Report::new(NutError::Protocol {
                message: format!("expected BEGIN LIST, got {begin:?}"),
            }));
        }

        let mut entries = Vec::new();
        loop {
            let words = protocol::tokenize(&self.read_line().await?)?;
            if words.first().map(String::as_str) == Some("END") {
                break;
            }
            entries.push(words);
        }
        Ok(entries)
    }

    async fn send(&mut self, command: &str) -> Result<(), Report<NutError>> {
        let stream = self.stream.get_mut();
        stream
            .write_all(format!("{command}\n").as_bytes())
            .await
            .change_context(NutError::Io {
                message: "failed to send request".to_string(),
            })?;
        stream.flush().await.change_context(NutError::Io {
            message: "failed to send request".to_string(),
        })
    }

    async fn read_line(&mut self) -> Result<String, Report<NutError>> {
        let mut line = String::new();
        let read = self
            .stream
            .read_line(&mut line)
            .await
            .change_context(NutError::Io {
                message: "failed to read response".to_string(),
            })?;
        if read == 0 {
            return Err(Report::new(NutError::Io {
                message: "connection closed by server".to_string(),
            }));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

#[async_trait::async_trait]
impl<S> TelemetrySource for NutClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    type Error = NutError;

    async fn list_ups(&mut self) -> Result<Vec<String>, Report<NutError>> {
        NutClient::list_ups(self).await
    }

    async fn snapshot(&mut self, ups: &str) -> Result<TelemetrySnapshot, Report<NutError>> {
        let vars = self.list_vars(ups).await?;
        Ok(snapshot_from_vars(&vars))
    }

    /// `ERR` replies such as `DATA-STALE` or `DRIVER-NOT-CONNECTED` concern a
    /// single device; the connection stays usable.
    fn is_device_unavailable(error: &Report<NutError>) -> bool {
        matches!(error.current_context(), NutError::Server { .. })
    }
}

/// Missing variables stay empty; the classifier treats them as unsafe.
fn snapshot_from_vars(vars: &BTreeMap<String, String>) -> TelemetrySnapshot {
    TelemetrySnapshot {
        status: vars.get(VAR_STATUS).cloned().unwrap_or_default(),
        battery_percent: vars
            .get(VAR_BATTERY_CHARGE)
            .and_then(|charge| charge.trim().parse::<f32>().ok()),
    }
}

fn with_default_port(address: &str) -> String {
    if address.starts_with('[') {
        // bracketed IPv6, optionally with a port
        if address.contains("]:") {
            address.to_string()
        } else {
            format!("{address}:{DEFAULT_NUT_PORT}")
        }
    } else {
        match address.matches(':').count() {
            0 => format!("{address}:{DEFAULT_NUT_PORT}"),
            1 => address.to_string(),
            _ => format!("[{address}]:{DEFAULT_NUT_PORT}"),
        }
    }
}

async fn with_timeout<T>(
    timeout: Duration,
    fut: impl Future<Output = Result<T, Report<NutError>>>,
) -> Result<T, Report<NutError>> {
    tokio::time::timeout(timeout, fut).await.map_err(|_| {
        Report::new(NutError::Timeout {
            seconds: timeout.as_secs(),
        })
    })?
}
