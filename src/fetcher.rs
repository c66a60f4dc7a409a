use tracing::{debug, info, instrument, warn};

use crate::graph::{GraphApi, GraphError, PageRequest};
use crate::model::Template;

/// List every template of `account`, following `paging.next` until the
/// listing is exhausted. The first failing page aborts the whole fetch.
/// A `next` link that repeats the page just fetched ends the listing.
#[instrument(skip(api))]
pub async fn fetch_all_templates(
    api: &dyn GraphApi,
    account: &str,
) -> Result<Vec<Template>, GraphError> {
    let mut templates = Vec::new();
    let mut request = PageRequest::First {
        account: account.to_string(),
    };
    let mut pages = 0usize;

    loop {
        let page = api.fetch_template_page(&request).await?;
        pages += 1;
        debug!(page = pages, size = page.data.len(), "template page received");
        let next = page.next_url().map(str::to_string);
        templates.extend(page.data);
        match next {
            Some(url) if request == PageRequest::Next(url.clone()) => {
                warn!(%url, "paging.next repeats the current page, stopping");
                break;
            }
            Some(url) => request = PageRequest::Next(url),
            None => break,
        }
    }

    info!(pages, total = templates.len(), "templates listed");
    Ok(templates)
}
