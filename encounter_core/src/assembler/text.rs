//! Placeholder substitution for scenario text pools.

/// Values available to `{placeholder}` substitution.
#[derive(Debug, Clone, Default)]
pub struct TemplateValues<'a> {
    pub ship: &'a str,
    pub ship_type: &'a str,
    pub captain: &'a str,
    pub rank: &'a str,
    pub faction: &'a str,
    pub origin: &'a str,
    pub destination: &'a str,
    pub code: &'a str,
    pub crew: u32,
    pub casualties: u32,
    pub credits: u32,
}

impl TemplateValues<'_> {
    fn lookup(&self, key: &str) -> Option<String> {
        let value = match key {
            "ship" => self.ship.to_string(),
            "ship_type" => self.ship_type.to_string(),
            "captain" => self.captain.to_string(),
            "rank" => self.rank.to_string(),
            "faction" => self.faction.to_string(),
            "origin" => self.origin.to_string(),
            "destination" => self.destination.to_string(),
            "code" => self.code.to_string(),
            "crew" => self.crew.to_string(),
            "casualties" => self.casualties.to_string(),
            "credits" => self.credits.to_string(),
            _ => return None,
        };
        Some(value)
    }
}

/// Replace known `{key}` placeholders. Unknown keys and stray braces are kept.
pub fn render(template: &str, values: &TemplateValues<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let key = &after[..close];
                match values.lookup(key) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
