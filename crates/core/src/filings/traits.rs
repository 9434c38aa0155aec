use async_trait::async_trait;

use crate::errors::SourceError;
use crate::filings::model::{FilingPage, Form4Filing, ThirteenFFiling};

/// Cursor-paged access to a filing search backend. `from` is the cursor
/// from the previous page's `next_from`; `None` starts from the beginning
/// of the backend's window.
#[async_trait]
pub trait FilingSource: Send + Sync {
    fn id(&self) -> &'static str;

    async fn fetch_thirteen_f(
        &self,
        from: Option<&str>,
    ) -> Result<FilingPage<ThirteenFFiling>, SourceError>;

    async fn fetch_form4(
        &self,
        from: Option<&str>,
    ) -> Result<FilingPage<Form4Filing>, SourceError>;
}
