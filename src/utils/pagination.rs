use serde::{Deserialize, Serialize};

/// 分页信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items_per_page: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

/// 一页数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PageInfo,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// 解析页码参数。
/// 缺失或不是整数时取第一页；小于 1 或超出范围时取最后一页。
pub fn resolve_page_number(page_param: Option<&str>, total_pages: usize) -> usize {
    match page_param.map(str::trim).map(str::parse::<i64>) {
        None | Some(Err(_)) => 1,
        Some(Ok(n)) if n < 1 => total_pages,
        Some(Ok(n)) => (n as usize).min(total_pages),
    }
}

/// 将有序序列切分为固定大小的页
pub fn paginate<T>(items: Vec<T>, per_page: usize, page_param: Option<&str>) -> Page<T> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    // 空序列也有第一页
    let total_pages = ((total_items + per_page - 1) / per_page).max(1);
    let current_page = resolve_page_number(page_param, total_pages);

    let start = (current_page - 1) * per_page;
    let items: Vec<T> = items.into_iter().skip(start).take(per_page).collect();

    Page {
        items,
        pagination: PageInfo {
            current_page,
            total_pages,
            total_items,
            items_per_page: per_page,
            has_next: current_page < total_pages,
            has_prev: current_page > 1,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_thirteen_items_two_pages() {
        let items: Vec<u32> = (1..=13).collect();

        let first = paginate(items.clone(), 10, Some("1"));
        assert_eq!(first.len(), 10);
        assert!(first.pagination.has_next);
        assert!(!first.pagination.has_prev);

        let second = paginate(items, 10, Some("2"));
        assert_eq!(second.items, vec![11, 12, 13]);
        assert_eq!(second.pagination.total_pages, 2);
        assert!(!second.pagination.has_next);
        assert!(second.pagination.has_prev);
    }

    #[test]
    fn test_page_parameter_fallbacks() {
        let items: Vec<u32> = (1..=25).collect();

        assert_eq!(paginate(items.clone(), 10, None).pagination.current_page, 1);
        assert_eq!(paginate(items.clone(), 10, Some("abc")).pagination.current_page, 1);
        assert_eq!(paginate(items.clone(), 10, Some("99")).pagination.current_page, 3);
        assert_eq!(paginate(items.clone(), 10, Some("0")).pagination.current_page, 3);
        assert_eq!(paginate(items, 10, Some("-4")).pagination.current_page, 3);
    }

    #[test]
    fn test_empty_sequence() {
        let page = paginate(Vec::<u32>::new(), 10, Some("5"));
        assert!(page.is_empty());
        assert_eq!(page.pagination.current_page, 1);
        assert_eq!(page.pagination.total_pages, 1);
        assert_eq!(page.pagination.total_items, 0);
    }

    proptest! {
        #[test]
        fn prop_pages_cover_sequence(total in 0usize..200, per_page in 1usize..30) {
            let items: Vec<usize> = (0..total).collect();
            let total_pages = paginate(items.clone(), per_page, None).pagination.total_pages;

            let mut seen = Vec::new();
            for number in 1..=total_pages {
                let page = paginate(items.clone(), per_page, Some(&number.to_string()));
                prop_assert!(page.len() <= per_page);
                prop_assert_eq!(page.pagination.current_page, number);
                seen.extend(page.items);
            }

            prop_assert_eq!(seen, items);
        }
    }
}
