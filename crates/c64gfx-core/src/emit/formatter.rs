/// Dialect-specific syntax for include files.
pub trait IncludeFormatter {
    fn comment_prefix(&self) -> &'static str;
    fn format_definition(&self, name: &str, value: u16, is_byte: bool) -> String;
    fn format_include(&self, file_name: &str) -> String;

    fn format_comment(&self, text: &str) -> String {
        if text.is_empty() {
            self.comment_prefix().to_string()
        } else {
            format!("{} {}", self.comment_prefix(), text)
        }
    }

    fn format_file_header(&self, title: &str, file_name: &str) -> String {
        let rule = format!("{}{}\n", self.comment_prefix(), "=-".repeat(39));
        let mut s = String::new();
        s.push_str(&rule);
        s.push_str(&format!("{}\n", self.format_comment("")));
        s.push_str(&format!("{}\n", self.format_comment(title)));
        s.push_str(&format!("{}\n", self.format_comment("Generated by c64gfx")));
        s.push_str(&format!("{}\n", self.format_comment("")));
        s.push_str(&format!("{}\n", self.format_comment("Use with:")));
        let usage = format!("  {}", self.format_include(file_name));
        s.push_str(&format!("{}\n", self.format_comment(&usage)));
        s.push_str(&format!("{}\n", self.format_comment("")));
        s.push_str(&rule);
        s
    }
}

fn operand(value: u16, is_byte: bool) -> String {
    if is_byte && value <= 0xFF {
        format!("${:02x}", value)
    } else {
        format!("${:04x}", value)
    }
}

pub struct TassFormatter;

impl IncludeFormatter for TassFormatter {
    fn comment_prefix(&self) -> &'static str {
        ";"
    }

    fn format_definition(&self, name: &str, value: u16, is_byte: bool) -> String {
        format!("{} = {}", name, operand(value, is_byte))
    }

    fn format_include(&self, file_name: &str) -> String {
        format!(".include \"{}\"", file_name)
    }
}

pub struct AcmeFormatter;

impl IncludeFormatter for AcmeFormatter {
    fn comment_prefix(&self) -> &'static str {
        ";"
    }

    fn format_definition(&self, name: &str, value: u16, is_byte: bool) -> String {
        format!("{} = {}", name, operand(value, is_byte))
    }

    fn format_include(&self, file_name: &str) -> String {
        format!("!source \"{}\"", file_name)
    }
}

pub struct Ca65Formatter;

impl IncludeFormatter for Ca65Formatter {
    fn comment_prefix(&self) -> &'static str {
        ";"
    }

    fn format_definition(&self, name: &str, value: u16, is_byte: bool) -> String {
        format!("{} = {}", name, operand(value, is_byte))
    }

    fn format_include(&self, file_name: &str) -> String {
        format!(".include \"{}\"", file_name)
    }
}

pub struct KickFormatter;

impl IncludeFormatter for KickFormatter {
    fn comment_prefix(&self) -> &'static str {
        "//"
    }

    fn format_definition(&self, name: &str, value: u16, is_byte: bool) -> String {
        format!(".const {} = {}", name, operand(value, is_byte))
    }

    fn format_include(&self, file_name: &str) -> String {
        format!("#import \"{}\"", file_name)
    }
}
