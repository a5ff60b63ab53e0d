use crate::models::{DocumentIndexTable, DocumentTable, Table};

pub struct SchemaManager {
    tables: Vec<Box<dyn Table + Send + Sync>>,
}

impl SchemaManager {
    pub fn new(mut tables: Vec<Box<dyn Table + Send + Sync>>) -> Self {
        Self::sort_tables(&mut tables);
        Self { tables }
    }

    /// Orders tables so that every table comes after the ones it depends on.
    fn sort_tables(tables: &mut Vec<Box<dyn Table + Send + Sync>>) {
        let mut to_sort = std::mem::take(tables);
        let mut deps_list: Vec<_> = to_sort.iter().map(|t| t.dependencies()).collect();
        let mut sorted = Vec::with_capacity(to_sort.len());

        while !to_sort.is_empty() {
            let independent_indices: Vec<usize> = deps_list
                .iter()
                .enumerate()
                .filter(|(_, deps)| deps.is_empty())
                .map(|(i, _)| i)
                .collect();

            assert!(
                !independent_indices.is_empty(),
                "Circular dependency detected or unresolved dependencies exist."
            );

            for &index in independent_indices.iter().rev() {
                sorted.push(to_sort.swap_remove(index));
                let _ = deps_list.swap_remove(index);
            }

            for deps in deps_list.iter_mut() {
                deps.retain(|dep_name| !sorted.iter().any(|table| table.name() == *dep_name));
            }
        }

        *tables = sorted;
    }

    pub fn create_schema(&self) -> Vec<String> {
        self.tables.iter().map(|table| table.create()).collect()
    }

    pub fn dispose_schema(&self) -> Vec<String> {
        self.tables.iter().rev().map(|table| table.dispose()).collect()
    }
}

impl Default for SchemaManager {
    fn default() -> Self {
        SchemaManager::new(vec![Box::new(DocumentIndexTable), Box::new(DocumentTable)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockTable {
        name: &'static str,
        dependencies: Vec<&'static str>,
    }

    impl Table for MockTable {
        fn name(&self) -> &'static str {
            self.name
        }

        fn create(&self) -> String {
            format!("CREATE {};", self.name)
        }

        fn dispose(&self) -> String {
            format!("DROP {};", self.name)
        }

        fn dependencies(&self) -> Vec<&'static str> {
            self.dependencies.clone()
        }
    }

    fn table(name: &'static str, dependencies: Vec<&'static str>) -> Box<dyn Table + Send + Sync> {
        Box::new(MockTable { name, dependencies })
    }

    #[test]
    fn test_dependencies_are_created_first() {
        let manager = SchemaManager::new(vec![
            table("room_links", vec!["rooms", "documents"]),
            table("rooms", vec!["documents"]),
            table("documents", vec![]),
        ]);

        assert_eq!(
            manager.create_schema(),
            vec!["CREATE documents;", "CREATE rooms;", "CREATE room_links;"]
        );
        assert_eq!(
            manager.dispose_schema(),
            vec!["DROP room_links;", "DROP rooms;", "DROP documents;"]
        );
    }

    #[test]
    fn test_default_schema_creates_documents_before_indexes() {
        let statements = SchemaManager::default().create_schema();

        assert!(statements[0].contains("CREATE TABLE IF NOT EXISTS documents"));
        assert!(statements[1].contains("CREATE INDEX IF NOT EXISTS"));
    }
}
