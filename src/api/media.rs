//! Media prompts, IVR menus and directories

use super::str_field;
use crate::crossbar::client::Client;
use crate::crossbar::envelope::{Content, Envelope};
use crate::crossbar::error::Error;
use crate::resource::{Descriptor, ResourceClass};
use serde_json::Value;

/// Audio stored under a media record
#[derive(Debug, Clone, Copy)]
pub struct MediaFile<'a> {
    pub bytes: &'a [u8],
    /// e.g. `audio/mpeg`, `audio/x-wav`
    pub content_type: &'a str,
}

account_resource!("media file", Medias, Media, list_media, get_media, create_media, update_media, delete_media);

account_resource!("menu", Menus, Menu, list_menus, get_menu, create_menu, update_menu, delete_menu);

account_resource!(
    "directory",
    Directories,
    Directory,
    list_directories,
    get_directory,
    create_directory,
    update_directory,
    delete_directory
);

fn media_raw(media_id: &str, account_id: Option<&str>) -> Descriptor {
    Descriptor::account(account_id)
        .then_id(ResourceClass::Media, media_id)
        .then(ResourceClass::Raw)
}

impl Client {
    /// Audio of a media record, undecoded
    pub async fn get_media_raw(
        &mut self,
        media_id: &str,
        account_id: Option<&str>,
    ) -> Result<Content, Error> {
        self.download(&media_raw(media_id, account_id)).await
    }

    /// Store the audio of an existing media record
    pub async fn upload_media_raw(
        &mut self,
        media_id: &str,
        file: MediaFile<'_>,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        self.upload(&media_raw(media_id, account_id), file.bytes, file.content_type)
            .await
    }

    /// Create a media record, then upload its audio once the record has an id.
    ///
    /// Answers with the upload's envelope when one was made, else the create's.
    pub async fn create_media_with_file(
        &mut self,
        data: &Value,
        file: Option<MediaFile<'_>>,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        let created = self.create_media(data, account_id).await?;
        let id = created
            .data()
            .and_then(|record| str_field(record, "id"))
            .map(str::to_string);

        match (file, id) {
            (Some(file), Some(id)) => self.upload_media_raw(&id, file, account_id).await,
            _ => Ok(created),
        }
    }

    /// Update a media record, then replace its audio when the update succeeded
    pub async fn update_media_with_file(
        &mut self,
        media_id: &str,
        data: &Value,
        file: Option<MediaFile<'_>>,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        let updated = self.update_media(media_id, data, account_id).await?;
        match file {
            Some(file) if updated.is_success() => {
                self.upload_media_raw(media_id, file, account_id).await
            }
            _ => Ok(updated),
        }
    }

    pub async fn find_media_by_name(&mut self, name: &str, account_id: Option<&str>) -> Result<Envelope, Error> {
        self.find_first(ResourceClass::Medias, &[("name", name)], account_id)
            .await
    }

    pub async fn find_menu_by_name(&mut self, name: &str, account_id: Option<&str>) -> Result<Envelope, Error> {
        self.find_first(ResourceClass::Menus, &[("name", name)], account_id)
            .await
    }

    pub async fn find_directory_by_name(
        &mut self,
        name: &str,
        account_id: Option<&str>,
    ) -> Result<Envelope, Error> {
        self.find_first(ResourceClass::Directories, &[("name", name)], account_id)
            .await
    }
}
