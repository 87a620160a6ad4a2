//! Downloads remotely hosted pad samples into the samples directory.
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::AudioError;

/// Default limit for a whole sample download.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Copies the resource at `url` to `dest`.
pub trait SampleFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), AudioError>;
}

/// Blocking HTTP(S) fetcher. Downloads land in a `.part` file that is renamed
/// into place once complete, so a failed transfer never leaves a truncated clip.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    fn download(&self, url: &str, dest: &Path) -> Result<u64, AudioError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| AudioError::Unavailable(format!("{}: {}", url, e)))?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let partial = dest.with_extension("part");
        let copied = File::create(&partial)
            .and_then(|mut file| io::copy(&mut response.into_reader(), &mut file))
            .and_then(|bytes| fs::rename(&partial, dest).map(|_| bytes));

        copied.map_err(|e| {
            if let Err(cleanup) = fs::remove_file(&partial) {
                debug!(path = ?partial, err = %cleanup, "No partial download to remove");
            }
            AudioError::Unavailable(format!("{}: {}", url, e))
        })
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl SampleFetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), AudioError> {
        info!(url, path = ?dest, "Downloading sample");
        let result = self.download(url, dest).map_err(|e| match e {
            AudioError::Io(e) => AudioError::Unavailable(format!("{}: {}", url, e)),
            other => other,
        });

        match result {
            Ok(bytes) => {
                debug!(url, bytes, "Sample downloaded");
                Ok(())
            }
            Err(e) => {
                warn!(url, err = %e, "Sample download failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serves one request with the given status line and body.
    fn serve_once(status: &'static str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 {
                if line == "\r\n" {
                    break;
                }
                line.clear();
            }

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                body.len()
            )
            .unwrap();
            stream.write_all(&body).unwrap();
        });

        format!("http://{}", addr)
    }

    #[test]
    fn test_http_fetch_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let host = serve_once("200 OK", b"RIFF-ish bytes".to_vec());
        let dest = dir.path().join("kits").join("Heater-1.mp3");

        HttpFetcher::default()
            .fetch(&format!("{}/drums/Heater-1.mp3", host), &dest)
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"RIFF-ish bytes");
        assert!(!dest.with_extension("part").exists());
    }

    #[test]
    fn test_http_fetch_not_found_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let host = serve_once("404 Not Found", Vec::new());
        let dest = dir.path().join("Kick.mp3");

        let result = HttpFetcher::default().fetch(&format!("{}/Kick.mp3", host), &dest);
        assert!(matches!(result, Err(AudioError::Unavailable(_))));
        assert!(!dest.exists());
    }

    #[test]
    fn test_http_fetch_unreachable_is_unavailable() {
        // Bind then drop to get a port nothing is listening on.
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("Clap.mp3");

        let result = HttpFetcher::new(Duration::from_secs(2))
            .fetch(&format!("http://127.0.0.1:{}/Clap.mp3", port), &dest);
        assert!(matches!(result, Err(AudioError::Unavailable(_))));
        assert!(!dest.exists());
    }
}
