//! Persistence abstractions over a relational store (spec §3, §4 "10%
//! Repositories/UoW"). One repository struct per aggregate, grounded on the
//! original's `infrastructure/sqlalchemy/*_repository.py` contract shape
//! (`add`/`get`/`update`/`list` per aggregate) and the teacher's
//! constructor-builds-fields idiom (`indexes/schema.rs::File::new`)
//! generalised to table/row construction via `sqlx`.

pub mod commit_repository;
pub mod embedding_repository;
pub mod enrichment_repository;
pub mod file_repository;
pub mod repository_repository;
pub mod snippet_repository;
pub mod task_status_repository;

pub use commit_repository::CommitRepository;
pub use embedding_repository::EmbeddingRepository;
pub use enrichment_repository::EnrichmentRepository;
pub use file_repository::FileRepository;
pub use repository_repository::RepositoryRepository;
pub use snippet_repository::SnippetRepository;
pub use task_status_repository::TaskStatusRepository;
