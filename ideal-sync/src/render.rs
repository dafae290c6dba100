//! Placeholder substitution for template files.
//!
//! Only `{{projectName}}`, `{{gitBranch}}`, `{{techStack}}` and
//! `{{initializedAt}}` are recognized. Anything else between braces is left
//! as written, so template files may contain arbitrary `{{ }}` syntax.

use ideal_core::ProjectConfig;

/// Values substituted into template files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVariables {
    pub project_name: String,
    pub git_branch: String,
    pub tech_stack: String,
    pub initialized_at: String,
}

impl TemplateVariables {
    pub fn from_config(config: &ProjectConfig) -> Self {
        // Must be stable across runs: a changing value would change every
        // rendered hash.
        let initialized_at = config
            .initialized_at
            .map(|t| t.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
            .unwrap_or_default();
        Self {
            project_name: config.project_name.clone(),
            git_branch: config.git_branch.clone(),
            tech_stack: config.tech_stack.to_string(),
            initialized_at,
        }
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "projectName" => Some(&self.project_name),
            "gitBranch" => Some(&self.git_branch),
            "techStack" => Some(&self.tech_stack),
            "initializedAt" => Some(&self.initialized_at),
            _ => None,
        }
    }

    /// Substitute known placeholders in `text`.
    pub fn render(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                out.push_str(&rest[start..]);
                return out;
            };
            match self.lookup(after[..end].trim()) {
                Some(value) => out.push_str(value),
                None => out.push_str(&rest[start..start + 2 + end + 2]),
            }
            rest = &after[end + 2..];
        }
        out.push_str(rest);
        out
    }

    /// Render UTF-8 content; other bytes pass through untouched.
    pub fn render_bytes(&self, bytes: Vec<u8>) -> Vec<u8> {
        match String::from_utf8(bytes) {
            Ok(text) => self.render(&text).into_bytes(),
            Err(e) => e.into_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> TemplateVariables {
        TemplateVariables {
            project_name: "shop".to_string(),
            git_branch: "main".to_string(),
            tech_stack: "React".to_string(),
            initialized_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn replaces_known_placeholders() {
        let out = vars().render("# {{projectName}} on {{ gitBranch }} ({{techStack}})");
        assert_eq!(out, "# shop on main (React)");
    }

    #[test]
    fn unknown_placeholders_are_untouched() {
        let out = vars().render("{{ other }} and {{projectName}}");
        assert_eq!(out, "{{ other }} and shop");
    }

    #[test]
    fn unterminated_braces_are_kept() {
        assert_eq!(vars().render("a {{projectName"), "a {{projectName");
    }

    #[test]
    fn binary_content_passes_through() {
        let bytes = vec![0xff, 0xfe, b'{', b'{'];
        assert_eq!(vars().render_bytes(bytes.clone()), bytes);
    }

    #[test]
    fn from_config_uses_display_stack() {
        let mut cfg = ProjectConfig::default();
        cfg.project_name = "x".to_string();
        cfg.tech_stack = ideal_core::TechStack::NodeJs;
        let v = TemplateVariables::from_config(&cfg);
        assert_eq!(v.tech_stack, "Node.js");
    }
}
