use crate::output::print_json;
use crate::settings::Sources;

/// `relnotes config` — show the resolved settings. The token is never printed.
pub fn run(sources: &Sources, json: bool) -> anyhow::Result<()> {
    let settings = sources.settings()?;
    let repos: Vec<String> = settings.repos.iter().map(|r| r.to_string()).collect();
    let config_file = sources
        .file_path
        .as_ref()
        .map(|p| p.display().to_string());

    if json {
        let value = serde_json::json!({
            "repos": repos,
            "token": settings.token.is_some(),
            "artifacts_path": settings.artifacts_path,
            "debug": settings.debug,
            "history": settings.history,
            "api_url": settings.api_url,
            "config_file": config_file,
        });
        return print_json(&value);
    }

    println!("repos:          {}", repos.join(", "));
    println!(
        "token:          {}",
        if settings.token.is_some() { "set" } else { "not set" }
    );
    println!("artifacts_path: {}", settings.artifacts_path.display());
    println!("debug:          {}", settings.debug);
    println!("history:        {}", settings.history);
    println!("api_url:        {}", settings.api_url);
    println!(
        "config_file:    {}",
        config_file.as_deref().unwrap_or("(none)")
    );
    Ok(())
}
