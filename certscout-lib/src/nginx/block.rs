use super::include::expand_includes;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

#[allow(clippy::expect_used)] // literal pattern
static SERVER_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*server\s*\{").expect("server pattern compiles"));

#[allow(clippy::expect_used)] // literal pattern
static SERVER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*server_name\s+([^;]+)\s*;").expect("server_name pattern compiles")
});

#[allow(clippy::expect_used)] // literal pattern
static SSL_CERTIFICATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*ssl_certificate\s+([^\s;]+)\s*;").expect("ssl_certificate pattern compiles")
});

#[allow(clippy::expect_used)] // literal pattern
static SSL_CERTIFICATE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*ssl_certificate_key\s+([^\s;]+)\s*;")
        .expect("ssl_certificate_key pattern compiles")
});

pub(super) fn starts_server_block(line: &str) -> bool {
    SERVER_BLOCK.is_match(line)
}

fn capture<'a>(re: &Regex, line: &'a str) -> Option<&'a str> {
    re.captures(line).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

/// A server name paired with one certificate path from the same block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsBinding {
    pub server_name: String,
    /// As written in the directive; relative paths are not resolved here.
    pub certificate_path: String,
}

/// One `server { ... }` stanza after include expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigBlock {
    lines: Vec<String>,
    server_names: Vec<String>,
    ssl_certificates: Vec<String>,
    ssl_certificate_keys: Vec<String>,
    tls_bindings: Vec<TlsBinding>,
}

impl ConfigBlock {
    /// Expand includes in `lines`, then collect the block's TLS directives.
    pub fn from_lines(lines: Vec<String>, root_dir: Option<&Path>) -> Self {
        let lines = expand_includes(lines, root_dir);

        let mut server_names: Vec<String> = Vec::new();
        let mut ssl_certificates = Vec::new();
        let mut ssl_certificate_keys = Vec::new();
        for line in &lines {
            if let Some(names) = capture(&SERVER_NAME, line) {
                for name in names.split_whitespace() {
                    if !server_names.iter().any(|n| n == name) {
                        server_names.push(name.to_string());
                    }
                }
            } else if let Some(path) = capture(&SSL_CERTIFICATE, line) {
                ssl_certificates.push(path.to_string());
            } else if let Some(path) = capture(&SSL_CERTIFICATE_KEY, line) {
                ssl_certificate_keys.push(path.to_string());
            }
        }

        let tls_bindings = match server_names.first() {
            Some(canonical) => ssl_certificates
                .iter()
                .map(|path| TlsBinding {
                    server_name: canonical.clone(),
                    certificate_path: path.clone(),
                })
                .collect(),
            None => Vec::new(),
        };

        tracing::debug!(
            server_name = server_names.first().map(String::as_str).unwrap_or(""),
            certificates = ssl_certificates.len(),
            "parsed server block"
        );

        ConfigBlock {
            lines,
            server_names,
            ssl_certificates,
            ssl_certificate_keys,
            tls_bindings,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Distinct names in declaration order; the first is canonical.
    pub fn server_names(&self) -> &[String] {
        &self.server_names
    }

    pub fn server_name(&self) -> Option<&str> {
        self.server_names.first().map(String::as_str)
    }

    pub fn ssl_certificates(&self) -> &[String] {
        &self.ssl_certificates
    }

    pub fn ssl_certificate_keys(&self) -> &[String] {
        &self.ssl_certificate_keys
    }

    pub fn tls_bindings(&self) -> &[TlsBinding] {
        &self.tls_bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(lines: &[&str]) -> ConfigBlock {
        ConfigBlock::from_lines(lines.iter().map(|l| l.to_string()).collect(), None)
    }

    #[test]
    fn server_opener_forms() {
        assert!(starts_server_block("server {"));
        assert!(starts_server_block("  server{"));
        assert!(starts_server_block("server   { listen 80;"));
        assert!(!starts_server_block("server_name a;"));
        assert!(!starts_server_block("upstream server {"));
    }

    #[test]
    fn directives_are_collected() {
        let b = block(&[
            "server {",
            "  server_name www.example.com example.com;",
            "  ssl_certificate /etc/ssl/example.pem;",
            "  ssl_certificate_key /etc/ssl/example.key;",
            "}",
        ]);
        assert_eq!(b.server_names(), ["www.example.com", "example.com"]);
        assert_eq!(b.server_name(), Some("www.example.com"));
        assert_eq!(b.ssl_certificates(), ["/etc/ssl/example.pem"]);
        assert_eq!(b.ssl_certificate_keys(), ["/etc/ssl/example.key"]);
        assert_eq!(
            b.tls_bindings(),
            [TlsBinding {
                server_name: "www.example.com".into(),
                certificate_path: "/etc/ssl/example.pem".into(),
            }]
        );
    }

    #[test]
    fn canonical_name_pairs_with_every_certificate() {
        let b = block(&[
            "server {",
            "server_name a.example b.example;",
            "ssl_certificate /rsa.pem;",
            "ssl_certificate /ecdsa.pem;",
        ]);
        let bindings = b.tls_bindings();
        assert_eq!(bindings.len(), 2);
        assert!(bindings.iter().all(|b| b.server_name == "a.example"));
    }

    #[test]
    fn no_server_name_means_no_bindings() {
        let b = block(&["server {", "ssl_certificate /a.pem;"]);
        assert!(b.tls_bindings().is_empty());
        let b = block(&["server {", "server_name a;"]);
        assert!(b.tls_bindings().is_empty());
    }

    #[test]
    fn repeated_server_names_are_kept_once() {
        let b = block(&["server {", "server_name a b;", "server_name b c;"]);
        assert_eq!(b.server_names(), ["a", "b", "c"]);
    }

    #[test]
    fn directive_needs_separator_and_semicolon() {
        let b = block(&[
            "server {",
            "server_names_hash_bucket_size 64;",
            "ssl_certificate /no-semicolon.pem",
            "ssl_certificate_key /k.pem;",
        ]);
        assert!(b.server_names().is_empty());
        assert!(b.ssl_certificates().is_empty());
        assert_eq!(b.ssl_certificate_keys(), ["/k.pem"]);
    }
}
