use std::future::Future;

use tokend_types::DataPage;

/// Collect every page of a cursor-paginated endpoint.
///
/// Stops on the last page, on a page without a next cursor, or when the
/// server hands back the cursor it was just given.
pub async fn load_all_pages<T, E, F, Fut>(mut fetch_page: F) -> Result<Vec<T>, E>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<DataPage<T>, E>>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = fetch_page(cursor.clone()).await?;
        items.extend(page.items);

        match page.next_cursor {
            Some(next) if !page.is_last && cursor.as_deref() != Some(next.as_str()) => {
                cursor = Some(next);
            }
            _ => break,
        }
    }

    Ok(items)
}
