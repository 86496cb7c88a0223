//! Confluence page and space tools.

use async_trait::async_trait;
use serde_json::Value;

use super::{finish_search, start_search};
use crate::backend::CommandFault;
use crate::dispatch::{CommandContext, CommandHandler};

/// `get_page`: one page by id.
#[derive(Debug, Default, Clone, Copy)]
pub struct GetPage;

#[async_trait]
impl CommandHandler for GetPage {
    async fn handle(&self, context: CommandContext) -> Result<Value, CommandFault> {
        let id = context.require_subject()?;
        context.caller().debug(format!("fetching page {id}"));
        context.backend().get_page(id).await
    }
}

/// `search_pages`: CQL search, optionally narrowed by the `space` parameter.
#[derive(Debug, Default, Clone, Copy)]
pub struct SearchPages;

#[async_trait]
impl CommandHandler for SearchPages {
    async fn handle(&self, context: CommandContext) -> Result<Value, CommandFault> {
        let (cql, limit) = start_search(&context, "pages")?;
        let space = context.string("space").map(str::to_owned);
        let pages = context.backend().search_pages(&cql, space, limit).await?;
        Ok(finish_search(&context, pages, limit, "pages"))
    }
}

/// `get_space`: one space by key.
#[derive(Debug, Default, Clone, Copy)]
pub struct GetSpace;

#[async_trait]
impl CommandHandler for GetSpace {
    async fn handle(&self, context: CommandContext) -> Result<Value, CommandFault> {
        let key = context.require_subject()?;
        context.backend().get_space(key).await
    }
}
