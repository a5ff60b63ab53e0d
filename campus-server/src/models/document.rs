use super::Table;

/// Every document kind lives in one table. `doc_type` and `created_at` are
/// copied out of the JSON body on write so they can be indexed.
#[derive(Clone)]
pub struct DocumentTable;

impl Table for DocumentTable {
    fn name(&self) -> &'static str {
        "documents"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                rev INTEGER NOT NULL DEFAULT 1,
                doc_type TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                body TEXT NOT NULL
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS documents;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}

#[derive(Clone)]
pub struct DocumentIndexTable;

impl Table for DocumentIndexTable {
    fn name(&self) -> &'static str {
        "documents_indexes"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE INDEX IF NOT EXISTS documents_doc_type_created_at
                ON documents (doc_type, created_at);
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP INDEX IF EXISTS documents_doc_type_created_at;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["documents"]
    }
}
