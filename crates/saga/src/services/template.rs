//! Template service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::ClaGroupId;
use domain::{AgreementKind, Document, DocumentUrls, TemplateFields};

use super::project_store::InMemoryProjectStore;
use super::{read, write};
use crate::context::RequestContext;
use crate::error::{Result, SagaError};

/// Trait for generating agreement documents from a template.
#[async_trait]
pub trait TemplateService: Send + Sync {
    /// Renders the template for a group and attaches the resulting
    /// documents to it.
    async fn attach_template(
        &self,
        ctx: &RequestContext,
        cla_group_id: ClaGroupId,
        template_id: &str,
        fields: &TemplateFields,
    ) -> Result<DocumentUrls>;
}

#[derive(Debug, Default)]
struct InMemoryTemplateState {
    attached: HashMap<ClaGroupId, String>,
    fail_on_attach: bool,
}

/// In-memory template service that writes documents into an
/// [`InMemoryProjectStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryTemplateService {
    projects: InMemoryProjectStore,
    state: Arc<RwLock<InMemoryTemplateState>>,
}

impl InMemoryTemplateService {
    pub fn new(projects: InMemoryProjectStore) -> Self {
        Self {
            projects,
            state: Arc::default(),
        }
    }

    /// Configures the service to fail attach calls.
    pub fn set_fail_on_attach(&self, fail: bool) {
        write(&self.state).fail_on_attach = fail;
    }

    /// Returns the template ID last attached to a group.
    pub fn attached_template(&self, cla_group_id: ClaGroupId) -> Option<String> {
        read(&self.state).attached.get(&cla_group_id).cloned()
    }
}

#[async_trait]
impl TemplateService for InMemoryTemplateService {
    async fn attach_template(
        &self,
        ctx: &RequestContext,
        cla_group_id: ClaGroupId,
        template_id: &str,
        _fields: &TemplateFields,
    ) -> Result<DocumentUrls> {
        ctx.check()?;
        if read(&self.state).fail_on_attach {
            return Err(SagaError::TemplateService(
                "unable to render template PDFs".to_string(),
            ));
        }

        let group = self
            .projects
            .get(cla_group_id)
            .ok_or_else(|| SagaError::ClaGroupNotFound(cla_group_id.to_string()))?;

        let mut urls = DocumentUrls::default();
        for kind in AgreementKind::ALL {
            if !group.is_enabled(kind) {
                continue;
            }
            let major = group
                .current_document(kind)
                .map_or(1, |d| d.major_version + 1);
            let url = format!("https://templates.local/{cla_group_id}/{kind}-{major}.0.pdf");
            self.projects.add_document(
                cla_group_id,
                kind,
                Document::new(format!("{template_id}-{kind}"), major, 0, url.clone()),
            )?;
            match kind {
                AgreementKind::Individual => urls.individual_url = Some(url),
                AgreementKind::Corporate => urls.corporate_url = Some(url),
            }
        }

        write(&self.state)
            .attached
            .insert(cla_group_id, template_id.to_string());
        Ok(urls)
    }
}
