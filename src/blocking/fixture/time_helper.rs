use chrono::Local;

/// Local wall clock time, formatted for reports and run banners.
pub fn now_string() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
