use regex::Regex;
use once_cell::sync::Lazy;

/// slug 最大长度
pub const MAX_SLUG_LENGTH: usize = 50;

static SLUG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^a-z0-9\-_]").expect("valid slug regex")
});

static VALID_SLUG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid slug regex")
});

static CONSECUTIVE_HYPHENS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-+").expect("valid hyphen regex")
});

/// 从标题生成 URL 友好的 slug
pub fn generate_slug(title: &str) -> String {
    // 转换为小写，空格替换为连字符
    let slug = title.to_lowercase().replace(' ', "-");

    // 移除所有非字母数字和连字符的字符
    let slug = SLUG_REGEX.replace_all(&slug, "");

    // 移除连续的连字符以及开头和结尾的连字符
    let mut slug = CONSECUTIVE_HYPHENS
        .replace_all(&slug, "-")
        .trim_matches('-')
        .to_string();

    if slug.len() > MAX_SLUG_LENGTH {
        slug.truncate(MAX_SLUG_LENGTH);
        slug = slug.trim_end_matches('-').to_string();
    }

    // 如果 slug 为空，使用默认值
    if slug.is_empty() {
        slug = "group".to_string();
    }

    slug
}

/// 为 slug 添加唯一后缀（如果需要的话）
pub fn make_slug_unique(base_slug: &str, existing_slugs: &[String]) -> String {
    let mut slug = base_slug.to_string();
    let mut counter = 1;

    while existing_slugs.contains(&slug) {
        let suffix = format!("-{}", counter);
        let keep = MAX_SLUG_LENGTH.saturating_sub(suffix.len()).min(base_slug.len());
        slug = format!("{}{}", &base_slug[..keep], suffix);
        counter += 1;
    }

    slug
}

/// 验证 slug 格式是否正确（字母、数字、连字符和下划线）
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slug.len() <= MAX_SLUG_LENGTH && VALID_SLUG_REGEX.is_match(slug)
}
