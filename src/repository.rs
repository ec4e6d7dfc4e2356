//! Team and watch-list operations over the document store
//!
//! One method per database interaction the API performs. Methods return
//! `Ok(None)` / [`Removal`] outcomes for the cases the API reports as 404,
//! and errors only for store failures and invalid ids.

use serde_json::Value;
use std::sync::Arc;

use crate::store::{CollectionPath, DocumentPath, DocumentStore};
use crate::types::{
    from_fields, to_fields, Fields, ListData, Members, Team, WatchList, WatchListEntry,
    LISTS_COLLECTION, TEAMS_COLLECTION,
};
use crate::Result;

/// Outcome of removing a member from a team
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    TeamNotFound,
    MemberNotFound,
}

#[derive(Clone)]
pub struct Repository {
    store: Arc<DocumentStore>,
}

impl Repository {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    fn teams() -> CollectionPath {
        CollectionPath::root(TEAMS_COLLECTION)
    }

    fn team_path(team: &str) -> Result<DocumentPath> {
        Self::teams().doc(team)
    }

    fn lists(team: &str) -> Result<CollectionPath> {
        Ok(Self::team_path(team)?.collection(LISTS_COLLECTION))
    }

    fn list_path(team: &str, list: &str) -> Result<DocumentPath> {
        Self::lists(team)?.doc(list)
    }

    async fn get_team(&self, path: &DocumentPath) -> Result<Option<Team>> {
        self.store.get(path).await?.map(from_fields).transpose()
    }

    pub async fn team_names(&self) -> Result<Vec<String>> {
        self.store.list_ids(&Self::teams()).await
    }

    /// Create a team, replacing any existing team of the same name
    pub async fn put_team(&self, name: &str) -> Result<()> {
        let path = Self::team_path(name)?;
        self.store.set(&path, to_fields(&Team::new(name))?).await
    }

    /// Delete a team document. Its watch lists are not touched.
    pub async fn delete_team(&self, name: &str) -> Result<()> {
        self.store.delete(&Self::team_path(name)?).await
    }

    /// Members of a team; an existing team without members yields an empty map
    pub async fn members(&self, team: &str) -> Result<Option<Members>> {
        let path = Self::team_path(team)?;
        Ok(self
            .get_team(&path)
            .await?
            .map(|team| team.members.unwrap_or_default()))
    }

    /// Replace a team's members map
    pub async fn set_members(&self, team: &str, members: Members) -> Result<()> {
        let mut update = Fields::new();
        update.insert("members".to_string(), Value::Object(members));
        self.store.update(&Self::team_path(team)?, update).await
    }

    pub async fn remove_member(&self, team: &str, member: &str) -> Result<Removal> {
        let path = Self::team_path(team)?;
        let Some(team) = self.get_team(&path).await? else {
            return Ok(Removal::TeamNotFound);
        };

        let mut members = match team.members {
            Some(members) if members.contains_key(member) => members,
            _ => return Ok(Removal::MemberNotFound),
        };
        members.remove(member);

        let mut update = Fields::new();
        update.insert("members".to_string(), Value::Object(members));
        self.store.update(&path, update).await?;
        Ok(Removal::Removed)
    }

    /// Move a team document to a new name in one atomic batch.
    ///
    /// Returns `false` when the old team does not exist. Watch lists stay
    /// under the old name.
    pub async fn rename_team(&self, old_name: &str, new_name: &str) -> Result<bool> {
        let old_path = Self::team_path(old_name)?;
        let new_path = Self::team_path(new_name)?;

        let Some(mut team) = self.get_team(&old_path).await? else {
            return Ok(false);
        };
        if old_path == new_path {
            return Ok(true);
        }

        team.name = new_name.to_string();

        let mut batch = self.store.batch();
        batch.set(&new_path, &to_fields(&team)?)?;
        batch.delete(&old_path);
        self.store.commit(batch).await?;

        tracing::info!(old = old_name, new = new_name, "Renamed team");
        Ok(true)
    }

    /// All watch lists of a team, each tagged with its `listName`
    pub async fn watch_lists(&self, team: &str) -> Result<Vec<WatchListEntry>> {
        self.store
            .list(&Self::lists(team)?)
            .await?
            .into_iter()
            .map(|(id, fields)| Ok(WatchListEntry::new(id, from_fields(fields)?)))
            .collect()
    }

    /// Create a watch list holding only its timestamp, replacing any existing one
    pub async fn put_watch_list(&self, team: &str, list: &str, timestamp: Value) -> Result<()> {
        let watch_list = WatchList::with_timestamp(timestamp);
        self.store
            .set(&Self::list_path(team, list)?, to_fields(&watch_list)?)
            .await
    }

    pub async fn delete_watch_list(&self, team: &str, list: &str) -> Result<()> {
        self.store.delete(&Self::list_path(team, list)?).await
    }

    pub async fn watch_list(&self, team: &str, list: &str) -> Result<Option<WatchList>> {
        self.store
            .get(&Self::list_path(team, list)?)
            .await?
            .map(from_fields)
            .transpose()
    }

    /// Merge schedule fields into an existing watch list
    pub async fn save_schedule(&self, team: &str, list: &str, schedule: Fields) -> Result<()> {
        self.store
            .update(&Self::list_path(team, list)?, schedule)
            .await
    }

    /// Store a full list document under its own `listName`
    pub async fn put_list(&self, team: &str, data: &ListData) -> Result<()> {
        self.store
            .set(&Self::list_path(team, &data.list_name)?, to_fields(data)?)
            .await
    }
}
