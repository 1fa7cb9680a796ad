use std::sync::Arc;

use tonic::{Request, Response, Status};

use crate::db::DocumentStore;
use crate::models::timestamp::format_rfc3339;
use crate::models::{ClockInModel, ClockInPayload, RecordId};
use crate::proto::clock_in::clock_in_service_server::ClockInService;
use crate::proto::clock_in::{
    ClockInRecord, CreateClockInReq, DeleteClockInReq, GetClockInReq, GetClockInRes,
    ListClockInsReq, ListClockInsRes, UpdateClockInReq,
};
use crate::proto::common::{CreatedRes, MessageRes};
use crate::query::{build_predicate, FilterParams};
use crate::repository::{Entity, Repository};

pub struct ClockInServiceImpl {
    records: Repository<ClockInModel>,
}

impl ClockInServiceImpl {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            records: Repository::new(store),
        }
    }

    fn model_to_proto(model: &ClockInModel) -> ClockInRecord {
        ClockInRecord {
            id: model.id.encode(),
            email: model.email.clone(),
            location: model.location.clone(),
            insert_datetime: format_rfc3339(&model.insert_datetime),
        }
    }
}

#[tonic::async_trait]
impl ClockInService for ClockInServiceImpl {
    async fn create_clock_in(
        &self,
        request: Request<CreateClockInReq>,
    ) -> Result<Response<CreatedRes>, Status> {
        let req = request.into_inner();
        if req.insert_datetime.is_some() {
            tracing::debug!("Ignoring caller-supplied insert_datetime on create");
        }

        let payload = ClockInPayload::parse(req.email, req.location)?;
        let id = self.records.create(&payload).await?;

        Ok(Response::new(CreatedRes { id: id.encode() }))
    }

    async fn get_clock_in(
        &self,
        request: Request<GetClockInReq>,
    ) -> Result<Response<GetClockInRes>, Status> {
        let req = request.into_inner();
        tracing::debug!("GetClockIn: id={}", req.id);
        let id = RecordId::decode(&req.id)?;

        let model = self.records.get_by_id(&id).await?;

        Ok(Response::new(GetClockInRes {
            record: Some(Self::model_to_proto(&model)),
        }))
    }

    async fn update_clock_in(
        &self,
        request: Request<UpdateClockInReq>,
    ) -> Result<Response<MessageRes>, Status> {
        let req = request.into_inner();
        let id = RecordId::decode(&req.id)?;
        let payload = ClockInPayload::parse(req.email, req.location)?;

        self.records.update_by_id(&id, &payload).await?;

        Ok(Response::new(MessageRes::new("Record updated")))
    }

    async fn delete_clock_in(
        &self,
        request: Request<DeleteClockInReq>,
    ) -> Result<Response<MessageRes>, Status> {
        let req = request.into_inner();
        let id = RecordId::decode(&req.id)?;

        self.records.delete_by_id(&id).await?;

        Ok(Response::new(MessageRes::new("Record deleted")))
    }

    async fn list_clock_ins(
        &self,
        request: Request<ListClockInsReq>,
    ) -> Result<Response<ListClockInsRes>, Status> {
        let req = request.into_inner();

        let params = FilterParams::new()
            .set("email", req.email)
            .set("location", req.location)
            .set("insert_datetime", req.insert_datetime);
        let predicate = build_predicate(ClockInModel::FILTERS, &params)?;

        let records: Vec<ClockInRecord> = self
            .records
            .list(&predicate)
            .await?
            .iter()
            .map(Self::model_to_proto)
            .collect();
        tracing::info!("ListClockIns: {} records", records.len());

        Ok(Response::new(ListClockInsRes { records }))
    }
}
