//! API-driven pull-request bucket assembly.
//!
//! [`PrCategorizer`] walks a user's tracked repositories, lists open PRs
//! from the GitHub API under the token-refresh wrapper, checks approvals
//! for in-scope authored PRs, and classifies each PR with the pure rules
//! in `gitpulse_core::categorize`.
//!
//! Failure policy: one repository's API error is logged and counted, and
//! the walk continues. An authorization failure gets exactly one token
//! refresh and one whole-repository retry (via the wrapper); if the
//! refresh itself fails, the run aborts with `ReauthRequired`, since
//! every remaining repository would fail the same way.

use std::sync::Arc;

use gitpulse_core::categorize::{classify, Classification, DigestBuckets, DigestScope, PrView};
use gitpulse_core::types::DbId;
use gitpulse_db::models::user::TrackedRepository;
use gitpulse_github::{with_token_refresh, GithubClient, GithubError, TokenService};

/// Buckets plus the error count for a digest run's summary line.
#[derive(Debug, Default)]
pub struct CategorizeOutcome {
    pub buckets: DigestBuckets,
    /// Repositories skipped because of API failures.
    pub failed_repositories: usize,
    /// In-scope PRs that matched no bucket rule (logged, not delivered).
    pub unmatched: usize,
}

/// Categorizes open pull requests for one subject user.
pub struct PrCategorizer {
    github: Arc<GithubClient>,
    tokens: Arc<dyn TokenService>,
}

impl PrCategorizer {
    pub fn new(github: Arc<GithubClient>, tokens: Arc<dyn TokenService>) -> Self {
        Self { github, tokens }
    }

    /// Walk `repositories` and categorize every open PR from the
    /// subject's perspective.
    pub async fn categorize(
        &self,
        user_id: DbId,
        github_login: &str,
        scope: &DigestScope,
        repositories: &[TrackedRepository],
    ) -> Result<CategorizeOutcome, GithubError> {
        let mut outcome = CategorizeOutcome::default();

        for repo in repositories {
            let views = match self.fetch_repository(user_id, github_login, scope, repo).await {
                Ok(views) => views,
                // Terminal: the user must reconnect; no other repository
                // can succeed with the same credentials.
                Err(GithubError::ReauthRequired) => return Err(GithubError::ReauthRequired),
                Err(e) => {
                    outcome.failed_repositories += 1;
                    tracing::warn!(
                        repository = %repo.full_name,
                        user_id,
                        error = %e,
                        "Skipping repository after API failure"
                    );
                    continue;
                }
            };

            for view in views {
                match classify(github_login, scope, &view) {
                    Classification::In(bucket) => outcome.buckets.push(bucket, view),
                    Classification::OutOfScope => {}
                    Classification::Unmatched => {
                        outcome.unmatched += 1;
                        tracing::warn!(
                            repository = %repo.full_name,
                            pr_number = view.number,
                            author = %view.author,
                            "Open PR matched no category bucket"
                        );
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// Fetch and assemble all PR views for one repository.
    ///
    /// The whole fetch runs inside the token-refresh wrapper so a 401 on
    /// any call retries the complete repository once with a fresh token.
    async fn fetch_repository(
        &self,
        user_id: DbId,
        github_login: &str,
        scope: &DigestScope,
        repo: &TrackedRepository,
    ) -> Result<Vec<PrView>, GithubError> {
        let github = Arc::clone(&self.github);
        let full_name = repo.full_name.clone();
        let subject = github_login.to_string();
        let scope = scope.clone();

        with_token_refresh(user_id, self.tokens.as_ref(), move |token| {
            let github = Arc::clone(&github);
            let full_name = full_name.clone();
            let subject = subject.clone();
            let scope = scope.clone();
            async move {
                let prs = github.list_open_pull_requests(&token, &full_name).await?;
                let mut views = Vec::with_capacity(prs.len());

                for pr in prs {
                    let mut view = PrView {
                        number: pr.number,
                        title: pr.title,
                        url: pr.html_url,
                        author: pr.user.login.clone(),
                        draft: pr.draft,
                        mergeable: pr.mergeable,
                        requested_reviewers: pr
                            .requested_reviewers
                            .iter()
                            .map(|a| a.login.clone())
                            .collect(),
                        assignees: pr.assignees.iter().map(|a| a.login.clone()).collect(),
                        approved_by_other: false,
                    };

                    // Approvals only matter for PRs authored in scope,
                    // so the review list is fetched just for those.
                    if authored_in_scope(&subject, &scope, &view.author) {
                        let reviews =
                            github.list_reviews(&token, &full_name, view.number).await?;
                        view.approved_by_other = reviews
                            .iter()
                            .any(|r| r.is_approval() && r.user.login != view.author);
                    }

                    views.push(view);
                }
                Ok(views)
            }
        })
        .await
    }
}

fn authored_in_scope(subject: &str, scope: &DigestScope, author: &str) -> bool {
    match scope {
        DigestScope::User => author == subject,
        DigestScope::Team { members } => members.contains(author),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
