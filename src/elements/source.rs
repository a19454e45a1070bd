use super::tle::parse_catalog;
use super::OrbitalElementSet;
use crate::config::SourceConfig;
use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Supplies element sets by catalog number or by group.
pub trait ElementSource {
    fn fetch(&self, catalog_number: u32) -> Result<OrbitalElementSet>;

    fn fetch_group(&self, group: &str) -> Result<Vec<OrbitalElementSet>>;
}

/// CelesTrak GP endpoint with an on-disk cache.
///
/// A cached response younger than `max_cache_age` is served without touching
/// the network. When the network fails, a stale cache is served with a
/// warning; only when neither is available does the fetch fail.
pub struct CelestrakSource {
    base_url: String,
    client: reqwest::blocking::Client,
    cache_dir: PathBuf,
    max_cache_age: Duration,
}

impl CelestrakSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let timeout = std::time::Duration::try_from_secs_f64(config.timeout_seconds)
            .ok()
            .filter(|t| !t.is_zero())
            .ok_or_else(|| Error::Config(format!("source timeout {} s is not usable", config.timeout_seconds)))?;
        let cache_dir = match &config.cache_dir {
            Some(dir) => dir.clone(),
            None => dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("skywatch"),
        };
        fs::create_dir_all(&cache_dir)?;

        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: config.base_url.clone(),
            client,
            cache_dir,
            max_cache_age: Duration::hours(config.cache_hours),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn load(&self, query: &str, cache_name: &str, label: &str) -> Result<Vec<OrbitalElementSet>> {
        let cache_path = self.cache_dir.join(cache_name);

        if let Some(modified) = cache_timestamp(&cache_path) {
            if Utc::now() - modified <= self.max_cache_age {
                debug!("serving {label} from cache {}", cache_path.display());
                if let Ok(elements) = read_cache(&cache_path) {
                    return Ok(elements);
                }
                warn!("cache {} is unreadable, refetching", cache_path.display());
            }
        }

        match self.download(query) {
            Ok(text) => {
                let elements = parse_catalog(&text).map_err(|e| Error::ElementsUnavailable {
                    catalog: label.to_string(),
                    reason: e.to_string(),
                })?;
                if elements.is_empty() {
                    return Err(Error::ElementsUnavailable {
                        catalog: label.to_string(),
                        reason: "source returned no element sets".into(),
                    });
                }
                if let Err(e) = fs::write(&cache_path, text) {
                    warn!("failed to write cache {}: {e}", cache_path.display());
                }
                info!("fetched {} element set(s) for {label}", elements.len());
                Ok(elements)
            }
            Err(reason) => match read_cache(&cache_path) {
                Ok(elements) => {
                    warn!("fetch for {label} failed ({reason}), serving stale cache");
                    Ok(elements)
                }
                Err(_) => Err(Error::ElementsUnavailable {
                    catalog: label.to_string(),
                    reason,
                }),
            },
        }
    }

    fn download(&self, query: &str) -> std::result::Result<String, String> {
        let url = format!("{}?{query}&FORMAT=tle", self.base_url);
        debug!("GET {url}");
        let response = self.client.get(&url).send().map_err(|e| e.to_string())?;
        let status = response.status();

        if status == reqwest::StatusCode::FORBIDDEN {
            return Err("HTTP 403 Forbidden".into());
        }
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }

        let text = response.text().map_err(|e| e.to_string())?;
        if text.trim().is_empty() || text.trim_start().starts_with("No GP data") {
            return Err("no GP data found".into());
        }
        Ok(text)
    }
}

impl ElementSource for CelestrakSource {
    fn fetch(&self, catalog_number: u32) -> Result<OrbitalElementSet> {
        let label = format!("{catalog_number:05}");
        let elements = self.load(
            &format!("CATNR={catalog_number}"),
            &format!("catnr_{catalog_number}.tle"),
            &label,
        )?;
        elements
            .into_iter()
            .find(|e| e.catalog_number == catalog_number)
            .ok_or(Error::ElementsUnavailable {
                catalog: label,
                reason: "response did not contain the requested object".into(),
            })
    }

    fn fetch_group(&self, group: &str) -> Result<Vec<OrbitalElementSet>> {
        let group = group.trim().to_ascii_lowercase();
        self.load(
            &format!("GROUP={group}"),
            &format!("group_{group}.tle"),
            &group,
        )
    }
}

fn cache_timestamp(path: &Path) -> Option<DateTime<Utc>> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(DateTime::<Utc>::from(modified))
}

fn read_cache(path: &Path) -> Result<Vec<OrbitalElementSet>> {
    let text = fs::read_to_string(path)?;
    let elements = parse_catalog(&text)?;
    if elements.is_empty() {
        return Err(Error::invalid_elements("empty cache"));
    }
    Ok(elements)
}

/// In-memory element source, for tests and offline use.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    elements: BTreeMap<u32, OrbitalElementSet>,
}

impl StaticSource {
    pub fn from_text(text: &str) -> Result<Self> {
        Ok(Self::from_elements(parse_catalog(text)?))
    }

    pub fn from_elements(elements: impl IntoIterator<Item = OrbitalElementSet>) -> Self {
        Self {
            elements: elements
                .into_iter()
                .map(|e| (e.catalog_number, e))
                .collect(),
        }
    }
}

impl ElementSource for StaticSource {
    fn fetch(&self, catalog_number: u32) -> Result<OrbitalElementSet> {
        self.elements
            .get(&catalog_number)
            .cloned()
            .ok_or(Error::ElementsUnavailable {
                catalog: format!("{catalog_number:05}"),
                reason: "not in static catalog".into(),
            })
    }

    /// Static catalogs have a single group holding everything.
    fn fetch_group(&self, _group: &str) -> Result<Vec<OrbitalElementSet>> {
        Ok(self.elements.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "\
ISS (ZARYA)
1 25544U 98067A   23248.54842295  .00018164  00000-0  32729-3 0  9994
2 25544  51.6416 357.6536 0005404 227.8174 205.8236 15.50066264424353
";

    fn unreachable_config(cache_dir: PathBuf) -> SourceConfig {
        SourceConfig {
            // port 9 is discard; nothing answers HTTP there
            base_url: "http://127.0.0.1:9/NORAD/elements/gp.php".into(),
            timeout_seconds: 1.0,
            cache_hours: 6,
            cache_dir: Some(cache_dir),
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("skywatch-test-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn static_source_lookup() {
        let source = StaticSource::from_text(TEXT).unwrap();
        assert_eq!(source.fetch(25544).unwrap().name.as_deref(), Some("ISS (ZARYA)"));
        assert!(matches!(
            source.fetch(5),
            Err(Error::ElementsUnavailable { .. })
        ));
        assert_eq!(source.fetch_group("stations").unwrap().len(), 1);
    }

    #[test]
    fn unreachable_source_without_cache_is_unavailable() {
        let source = CelestrakSource::new(&unreachable_config(scratch_dir("nocache"))).unwrap();
        assert!(matches!(
            source.fetch(25544),
            Err(Error::ElementsUnavailable { .. })
        ));
    }

    #[test]
    fn fresh_cache_is_served() {
        let dir = scratch_dir("cache");
        let source = CelestrakSource::new(&unreachable_config(dir.clone())).unwrap();
        fs::write(dir.join("catnr_25544.tle"), TEXT).unwrap();
        let elements = source.fetch(25544).unwrap();
        assert_eq!(elements.catalog_number, 25544);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn unusable_timeout_is_a_config_error() {
        for timeout in [f64::NAN, -1.0, 0.0] {
            let config = SourceConfig {
                timeout_seconds: timeout,
                ..unreachable_config(scratch_dir("timeout"))
            };
            assert!(matches!(CelestrakSource::new(&config), Err(Error::Config(_))), "{timeout}");
        }
    }
}
