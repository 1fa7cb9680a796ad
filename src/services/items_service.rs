use std::sync::Arc;

use tonic::{Request, Response, Status};

use crate::db::DocumentStore;
use crate::models::timestamp::format_rfc3339;
use crate::models::{ItemModel, ItemPayload, RecordId};
use crate::proto::common::{CreatedRes, MessageRes};
use crate::proto::items::items_service_server::ItemsService;
use crate::proto::items::{
    CreateItemReq, DeleteItemReq, GetItemReq, GetItemRes, Item, ItemGroup, ListItemsReq,
    ListItemsRes, UpdateItemReq,
};
use crate::query::{build_predicate, FilterParams, GroupCountStage};
use crate::repository::{Entity, Repository};

/// Items are listed as per-owner counts rather than raw records.
const GROUP_BY_FIELD: &str = "email";

pub struct ItemsServiceImpl {
    items: Repository<ItemModel>,
}

impl ItemsServiceImpl {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            items: Repository::new(store),
        }
    }

    fn model_to_proto(model: &ItemModel) -> Item {
        Item {
            id: model.id.encode(),
            email: model.email.clone(),
            item_name: model.item_name.clone(),
            quantity: model.quantity,
            expiry_date: format_rfc3339(&model.expiry_date),
            insert_date: format_rfc3339(&model.insert_date),
        }
    }
}

#[tonic::async_trait]
impl ItemsService for ItemsServiceImpl {
    async fn create_item(
        &self,
        request: Request<CreateItemReq>,
    ) -> Result<Response<CreatedRes>, Status> {
        let req = request.into_inner();
        if req.insert_date.is_some() {
            tracing::debug!("Ignoring caller-supplied insert_date on create");
        }

        let payload = ItemPayload::parse(req.email, req.item_name, req.quantity, &req.expiry_date)?;
        let id = self.items.create(&payload).await?;

        Ok(Response::new(CreatedRes { id: id.encode() }))
    }

    async fn get_item(&self, request: Request<GetItemReq>) -> Result<Response<GetItemRes>, Status> {
        let req = request.into_inner();
        let id = RecordId::decode(&req.id)?;

        let model = self.items.get_by_id(&id).await?;

        Ok(Response::new(GetItemRes {
            item: Some(Self::model_to_proto(&model)),
        }))
    }

    async fn update_item(
        &self,
        request: Request<UpdateItemReq>,
    ) -> Result<Response<MessageRes>, Status> {
        let req = request.into_inner();
        let id = RecordId::decode(&req.id)?;
        let payload = ItemPayload::parse(req.email, req.item_name, req.quantity, &req.expiry_date)?;

        self.items.update_by_id(&id, &payload).await?;

        Ok(Response::new(MessageRes::new("Item updated")))
    }

    async fn delete_item(
        &self,
        request: Request<DeleteItemReq>,
    ) -> Result<Response<MessageRes>, Status> {
        let req = request.into_inner();
        let id = RecordId::decode(&req.id)?;

        self.items.delete_by_id(&id).await?;

        Ok(Response::new(MessageRes::new("Item deleted")))
    }

    async fn list_items(
        &self,
        request: Request<ListItemsReq>,
    ) -> Result<Response<ListItemsRes>, Status> {
        let req = request.into_inner();

        let params = FilterParams::new()
            .set("email", req.email)
            .set("expiry_date", req.expiry_date)
            .set("insert_date", req.insert_date)
            .set("quantity", req.quantity);
        let predicate = build_predicate(ItemModel::FILTERS, &params)?;
        tracing::info!("ListItems: predicate={:?}", predicate);

        let groups = self
            .items
            .count_by(&GroupCountStage::new(predicate, GROUP_BY_FIELD))
            .await?
            .into_iter()
            .map(|g| ItemGroup {
                email: g.key,
                count: g.count,
            })
            .collect();

        Ok(Response::new(ListItemsRes { groups }))
    }
}
