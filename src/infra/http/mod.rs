mod middleware;
mod public;

pub use middleware::{REQUEST_ID_HEADER, RequestContext, RevalidationSummary};
pub use public::{
    DOCUMENT_TITLE, HEADER_INSTANCE, HttpState, REVALIDATE_HEADER, build_router, render_document,
};
