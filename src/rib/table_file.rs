// Flat-file routing table: one `destination netmask gateway iface metric` per line

use super::Rib;
use crate::error::{AppError, AppResult};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

const FIELDS_PER_LINE: usize = 5;

/// One parsed line of the table file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRecord {
    pub line: usize,
    pub destination: String,
    pub netmask: String,
    pub gateway: String,
    pub iface: String,
    pub metric: u32,
}

/// Split table file text into records. Blank lines and `#` comments are skipped.
pub fn parse_table(content: &str) -> AppResult<Vec<RouteRecord>> {
    let mut records = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        if parts.len() != FIELDS_PER_LINE {
            return Err(AppError::table_file(
                line_no,
                format!("expected {} fields, found {}", FIELDS_PER_LINE, parts.len()),
            ));
        }

        let metric = parts[4].parse::<u32>().map_err(|_| {
            AppError::table_file(line_no, format!("invalid metric '{}'", parts[4]))
        })?;

        records.push(RouteRecord {
            line: line_no,
            destination: parts[0].to_string(),
            netmask: parts[1].to_string(),
            gateway: parts[2].to_string(),
            iface: parts[3].to_string(),
            metric,
        });
    }

    Ok(records)
}

/// Add every record of `content` to `rib` in file order
pub fn load_str(content: &str, rib: &mut Rib) -> AppResult<usize> {
    let records = parse_table(content)?;

    for record in &records {
        rib.add(
            &record.destination,
            &record.netmask,
            &record.gateway,
            &record.iface,
            record.metric,
        )
        .map_err(|e| {
            tracing::warn!("Rejected table line {}: {}", record.line, e);
            AppError::table_file(record.line, e.to_string())
        })?;
    }

    Ok(records.len())
}

/// Load a table file into `rib`. A missing file is an empty table.
pub fn load(path: &Path, rib: &mut Rib) -> AppResult<usize> {
    if !path.exists() {
        tracing::info!("Routing table {} not found, starting empty", path.display());
        return Ok(0);
    }

    let content = fs::read_to_string(path)?;
    let count = load_str(&content, rib)?;
    tracing::info!("Loaded {} route(s) from {}", count, path.display());
    Ok(count)
}

/// Render the table in file format, entries in table order
pub fn format_table(rib: &Rib) -> String {
    let mut out = format!(
        "# librib routing table ({}, {})\n",
        get_hostname(),
        chrono::Utc::now().to_rfc3339()
    );
    for route in rib.routes() {
        out.push_str(&format!(
            "{} {} {} {} {}\n",
            route.destination, route.netmask, route.gateway, route.iface, route.metric
        ));
    }
    out
}

/// Write the table to `path`, replacing the previous file atomically
/// through a uniquely named sibling that is removed if writing fails
pub fn save(path: &Path, rib: &Rib) -> AppResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(format_table(rib).as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| AppError::Io(e.error))?;
    tracing::info!("Committed {} route(s) to {}", rib.len(), path.display());
    Ok(())
}

fn get_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "\
# destination netmask gateway iface metric
0.0.0.0 0.0.0.0 192.168.1.254 eth0 100

010.000.000.000   255.0.0.0\t10.0.0.1 eth1 10
";

    #[test]
    fn test_parse_table() {
        let records = parse_table(SAMPLE).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 2);
        assert_eq!(records[0].gateway, "192.168.1.254");
        assert_eq!(records[1].line, 4);
        assert_eq!(records[1].destination, "010.000.000.000");
        assert_eq!(records[1].metric, 10);
    }

    #[test]
    fn test_parse_table_reports_bad_lines() {
        let err = parse_table("10.0.0.0 255.0.0.0 10.0.0.1 eth0\n").unwrap_err();
        assert_eq!(err.line(), Some(1));

        let err = parse_table("\n10.0.0.0 255.0.0.0 10.0.0.1 eth0 -3\n").unwrap_err();
        assert_eq!(err.line(), Some(2));
        assert!(err.to_string().contains("invalid metric"));
    }

    #[test]
    fn test_load_str_canonicalizes_and_keeps_order() {
        let mut rib = Rib::new();
        assert_eq!(load_str(SAMPLE, &mut rib).unwrap(), 2);
        assert_eq!(rib.routes()[0].destination, "0.0.0.0");
        assert_eq!(rib.routes()[1].destination, "10.0.0.0");
    }

    #[test]
    fn test_load_str_reports_store_errors_with_line() {
        let content = "10.0.0.0 255.0.0.0 10.0.0.1 eth0 1\n10.0.0.0 255.0.0.0 10.0.0.2 eth1 2\n";
        let mut rib = Rib::new();
        let err = load_str(content, &mut rib).unwrap_err();
        assert_eq!(err.line(), Some(2));
        assert!(err.to_string().contains("Duplicate record"));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let mut rib = Rib::new();
        assert_eq!(load(&dir.path().join("absent.txt"), &mut rib).unwrap(), 0);
        assert!(rib.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("routes.txt");

        let mut rib = Rib::new();
        rib.add("10.0.0.0", "255.0.0.0", "10.0.0.1", "eth1", 10).unwrap();
        rib.add("0.0.0.0", "0.0.0.0", "192.168.1.254", "eth0", 100).unwrap();
        save(&path, &rib).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# librib routing table"));
        assert!(text.contains("10.0.0.0 255.0.0.0 10.0.0.1 eth1 10\n"));

        let mut reloaded = Rib::new();
        assert_eq!(load(&path, &mut reloaded).unwrap(), 2);
        assert_eq!(reloaded.routes(), rib.routes());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_leaves_sibling_files_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("routes.txt");
        let sibling = dir.path().join("routes.tmp");
        fs::write(&sibling, "keep me").unwrap();

        let mut rib = Rib::new();
        rib.add("10.0.0.0", "255.0.0.0", "10.0.0.1", "eth1", 10).unwrap();
        save(&path, &rib).unwrap();

        assert_eq!(fs::read_to_string(&sibling).unwrap(), "keep me");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_save_into_missing_directory_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("routes.txt");

        assert!(matches!(save(&path, &Rib::new()), Err(AppError::Io(_))));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
