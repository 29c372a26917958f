use std::net::IpAddr;

use ipnet::IpNet;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub secret_key: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub max_body_size: usize,
    pub trusted_proxies: Vec<IpNet>,
    pub log_level: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let secret_key = env_required("PORTAL_SECRET_KEY")?;
        if secret_key.trim().is_empty() {
            return Err("PORTAL_SECRET_KEY must not be empty".to_string());
        }

        let host: IpAddr = env_or("PORTAL_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid PORTAL_HOST: {e}"))?;

        let port: u16 = env_or("PORTAL_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid PORTAL_PORT: {e}"))?;

        let base_url = env_or("PORTAL_BASE_URL", &format!("http://{host}:{port}"));

        let max_body_size: usize = env_or("PORTAL_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid PORTAL_MAX_BODY_SIZE: {e}"))?;

        let trusted_proxies = parse_trusted_proxies(&env_or("PORTAL_TRUSTED_PROXIES", ""))?;

        let log_level = env_or("PORTAL_LOG_LEVEL", "info");

        let smtp = match (
            std::env::var("PORTAL_SMTP_HOST").ok(),
            std::env::var("PORTAL_SMTP_PORT").ok(),
            std::env::var("PORTAL_SMTP_USER").ok(),
            std::env::var("PORTAL_SMTP_PASS").ok(),
            std::env::var("PORTAL_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid PORTAL_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            secret_key,
            host,
            port,
            base_url,
            max_body_size,
            trusted_proxies,
            log_level,
            smtp,
        })
    }

    /// Cookies get the `Secure` attribute when the portal is served over HTTPS.
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

fn parse_trusted_proxies(raw: &str) -> Result<Vec<IpNet>, String> {
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.trim()
                .parse()
                .map_err(|e| format!("Invalid PORTAL_TRUSTED_PROXIES entry '{s}': {e}"))
        })
        .collect()
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trusted_proxies_accepts_cidrs_and_skips_blanks() {
        let nets = parse_trusted_proxies("10.0.0.0/8, ,192.168.1.0/24").unwrap();
        assert_eq!(nets.len(), 2);
        assert!(nets[0].contains(&"10.1.2.3".parse::<IpAddr>().unwrap()));
    }

    #[test]
    fn trusted_proxies_rejects_garbage() {
        let err = parse_trusted_proxies("not-a-net").unwrap_err();
        assert!(err.contains("not-a-net"));
    }

    #[test]
    fn empty_trusted_proxies_is_empty_list() {
        assert!(parse_trusted_proxies("").unwrap().is_empty());
    }
}
