use kheyma_api::PageResponse;

/// Page size used by the admin dashboard
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// State of a paginated listing
#[derive(Debug, Clone, PartialEq)]
pub struct PageState<T> {
    /// Index of the page whose items are shown
    pub page_index: u32,
    /// Index of the most recently requested page
    pub requested_page: u32,
    /// Items per page
    pub page_size: u32,
    /// Number of pages reported by the server; `None` before the first response
    pub total_pages: Option<u32>,
    /// Number of items across all pages
    pub total_elements: u64,
    /// `page_index == 0`
    pub is_first: bool,
    /// `page_index == total_pages - 1`, or no pages at all
    pub is_last: bool,
    /// Items of the shown page, at most `page_size`
    pub items: Vec<T>,
    /// A request is outstanding
    pub loading: bool,
    /// Message of the last failed request, cleared by the next success
    pub error: Option<String>,
}

impl<T> PageState<T> {
    /// Empty state before the first load
    pub fn new(page_size: u32) -> Self {
        Self {
            page_index: 0,
            requested_page: 0,
            page_size: page_size.max(1),
            total_pages: None,
            total_elements: 0,
            is_first: true,
            is_last: false,
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }

    /// Whether `page_index` may be requested
    ///
    /// Page 0 is always loadable; other pages only within the server-reported
    /// range once it is known.
    pub fn can_load(&self, page_index: u32) -> bool {
        match self.total_pages {
            _ if page_index == 0 => true,
            None => true,
            Some(total) => page_index < total,
        }
    }

    /// Whether a page follows the requested one
    pub fn has_next(&self) -> bool {
        match self.total_pages {
            Some(total) => self.requested_page.saturating_add(1) < total,
            None => false,
        }
    }

    /// Whether a page precedes the requested one
    pub fn has_previous(&self) -> bool {
        self.requested_page > 0
    }

    /// Replace the shown page with a server response
    pub(crate) fn apply(&mut self, page_index: u32, response: PageResponse<T>) {
        let total_pages = response.total_pages;

        let mut items = response.content;
        items.truncate(self.page_size as usize);

        self.items = items;
        self.page_index = page_index;
        self.total_pages = Some(total_pages);
        self.total_elements = response.total_elements;
        self.is_first = page_index == 0;
        self.is_last = total_pages == 0 || page_index >= total_pages.saturating_sub(1);
        self.loading = false;
        self.error = None;
    }
}
