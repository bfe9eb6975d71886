#![allow(dead_code)]

pub mod route_tree {
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// A routes directory on disk, removed on drop.
    pub struct RouteTree {
        dir: TempDir,
    }

    impl RouteTree {
        /// Create a tree with one empty file per relative path.
        pub fn new(files: &[&str]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let tree = Self { dir };
            for file in files {
                tree.add(file);
            }
            tree
        }

        /// The demo layout used across the integration tests.
        pub fn basic() -> Self {
            Self::new(&[
                "v1/hello.rs",
                "v1/dynamic/[id].rs",
                "v1/dynamic/[slug]/[id].rs",
                "v1/list/[projectId].rs",
                "v1/list/item-[itemId].rs",
                "v1/methods/post.rs",
                "v1/methods/multi-handler.rs",
                "v1/hooks/on-error.rs",
                "v1/hooks/on-request.rs",
            ])
        }

        pub fn add(&self, relative: &str) -> PathBuf {
            let path = self.dir.path().join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, "").unwrap();
            path
        }

        pub fn root(&self) -> &Path {
            self.dir.path()
        }

        pub fn extensions() -> Vec<String> {
            vec!["rs".to_string()]
        }
    }
}

pub mod test_server {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener, TcpStream};
    use std::sync::Once;
    use std::time::Duration;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }

    /// A local address nothing is listening on yet.
    pub fn free_addr() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr
    }

    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 1024];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {e:?}"),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Status code, lowercase header lines and body of a raw response.
    pub fn parse_response(resp: &str) -> (u16, Vec<(String, String)>, String) {
        let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
        let mut lines = head.lines();
        let status = lines
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|code| code.parse().ok())
            .unwrap_or(0);
        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
            .collect();
        (status, headers, body.to_string())
    }

    pub fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}
