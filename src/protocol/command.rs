#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    CatalogExport,
    CatalogImport,
    CatalogConvert,
    CatalogQa,
    Translate,
    EntityRender,
    EntityWrite,
    Unknown,
}

impl Command {
    /// Commands that change the datastore and must persist it afterwards.
    pub fn writes_store(self) -> bool {
        matches!(
            self,
            Command::CatalogImport | Command::Translate | Command::EntityWrite
        )
    }
}

impl From<&str> for Command {
    fn from(s: &str) -> Self {
        match s {
            "ping" => Command::Ping,
            "catalog.export" => Command::CatalogExport,
            "catalog.import" => Command::CatalogImport,
            "catalog.convert" => Command::CatalogConvert,
            "catalog.qa" => Command::CatalogQa,
            "translate" => Command::Translate,
            "entity.render" => Command::EntityRender,
            "entity.write" => Command::EntityWrite,
            _ => Command::Unknown,
        }
    }
}
