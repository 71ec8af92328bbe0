use std::sync::LazyLock;

/// Defines the application version.
///
/// Git metadata is optional: builds outside a git checkout report `unknown`.
pub static VERSION: LazyLock<String> = LazyLock::new(|| {
    format_version(
        env!("IMAGE_VERSION"),
        option_env!("VERGEN_GIT_SHA"),
        option_env!("VERGEN_GIT_DIRTY"),
    )
});

fn format_version(image_version: &str, sha: Option<&str>, dirty: Option<&str>) -> String {
    format!(
        "{}-{}{}",
        image_version,
        sha.unwrap_or("unknown"),
        if dirty == Some("true") { "-dirty" } else { "" }
    )
}
