use std::time::Duration;

use robotstxt::DefaultMatcher;

/// Parsed robots.txt of one host.
///
/// Allow/Disallow evaluation is delegated to the Google matcher; only
/// `Crawl-delay`, which the matcher ignores, is parsed here.
#[derive(Debug, Clone, PartialEq)]
pub struct RobotsRules {
    body: String,
    groups: Vec<AgentGroup>,
}

#[derive(Debug, Clone, PartialEq)]
struct AgentGroup {
    agents: Vec<String>,
    crawl_delay: Option<f64>,
}

impl RobotsRules {
    pub fn parse(body: &str) -> Self {
        let mut groups: Vec<AgentGroup> = Vec::new();
        let mut collecting_agents = false;

        for line in body.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if !collecting_agents || groups.is_empty() {
                        groups.push(AgentGroup {
                            agents: Vec::new(),
                            crawl_delay: None,
                        });
                    }
                    collecting_agents = true;
                    if let Some(group) = groups.last_mut() {
                        group.agents.push(value.to_ascii_lowercase());
                    }
                }
                "crawl-delay" => {
                    collecting_agents = false;
                    let seconds = value.parse::<f64>().ok().filter(|s| s.is_finite() && *s >= 0.0);
                    if let (Some(group), Some(seconds)) = (groups.last_mut(), seconds) {
                        group.crawl_delay = Some(seconds);
                    }
                }
                _ => collecting_agents = false,
            }
        }

        Self {
            body: body.to_string(),
            groups,
        }
    }

    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        let token = product_token(user_agent);
        DefaultMatcher::default().one_agent_allowed_by_robots(&self.body, &token, url)
    }

    /// Declared delay for the group matching `user_agent`, falling back to
    /// the `*` group.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        let token = product_token(user_agent);
        let specific = self
            .groups
            .iter()
            .find(|group| group.agents.iter().any(|agent| agent == &token));
        let group = specific.or_else(|| {
            self.groups
                .iter()
                .find(|group| group.agents.iter().any(|agent| agent == "*"))
        })?;
        group
            .crawl_delay
            .map(|seconds| Duration::from_millis((seconds * 1000.0).round() as u64))
    }
}

/// `"Mozilla/5.0 (X11)"` -> `"mozilla"`.
fn product_token(user_agent: &str) -> String {
    user_agent
        .trim()
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}
