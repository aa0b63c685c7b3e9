//! TCP 传输回环测试
//!
//! 在本机起一个监听端口扮演控制器，验证帧重组与请求/应答匹配。

use cobot_protocol::{CobotFrame, ProtocolCode, control};
use cobot_transport::{TcpTransport, Transport, TransportError};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

fn spawn_controller<F>(handler: F) -> std::net::SocketAddr
where
    F: FnOnce(std::net::TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        handler(stream);
    });
    addr
}

#[test]
fn test_request_reply_over_split_writes() {
    let addr = spawn_controller(|mut stream| {
        let mut request = [0u8; 6];
        stream.read_exact(&mut request).unwrap();
        assert_eq!(request, [0xFE, 0xFE, 0x03, 0x3B, 0x07, 0xFA]);

        // 垃圾字节 + 分两次写出的应答帧
        stream.write_all(&[0x00, 0x42, 0xFE, 0xFE, 0x04]).unwrap();
        stream.flush().unwrap();
        thread::sleep(Duration::from_millis(20));
        stream.write_all(&[0x3B, 0x04, 0xE0, 0xFA]).unwrap();
        thread::sleep(Duration::from_millis(50));
    });

    let mut transport = TcpTransport::connect(addr, Duration::from_secs(1)).unwrap();
    let reply = transport
        .request(&control::get_encoder(7), Duration::from_millis(500))
        .unwrap();
    assert!(reply.is(ProtocolCode::GetEncoder));
    assert_eq!(cobot_protocol::decode_encoder(&reply).unwrap(), 1248);
}

#[test]
fn test_two_frames_in_one_write() {
    let addr = spawn_controller(|mut stream| {
        let mut bytes = CobotFrame::new(ProtocolCode::PowerOn, &[]).to_bytes();
        bytes.extend(CobotFrame::new(ProtocolCode::IsControllerConnected, &[1]).to_bytes());
        stream.write_all(&bytes).unwrap();
        thread::sleep(Duration::from_millis(50));
    });

    let mut transport = TcpTransport::connect(addr, Duration::from_secs(1)).unwrap();
    let first = transport.receive_timeout(Duration::from_millis(500)).unwrap();
    let second = transport.receive_timeout(Duration::from_millis(500)).unwrap();
    assert!(first.is(ProtocolCode::PowerOn));
    assert!(second.is(ProtocolCode::IsControllerConnected));
    assert_eq!(second.payload, vec![1]);
}

#[test]
fn test_receive_timeout_when_controller_silent() {
    let addr = spawn_controller(|_stream| {
        thread::sleep(Duration::from_millis(200));
    });

    let mut transport = TcpTransport::connect(addr, Duration::from_secs(1)).unwrap();
    let err = transport
        .receive_timeout(Duration::from_millis(30))
        .unwrap_err();
    assert!(matches!(err, TransportError::Timeout));
}

#[test]
fn test_connect_refused() {
    // 绑定后立即释放，端口大概率无人监听
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let result = TcpTransport::connect(addr, Duration::from_millis(200));
    assert!(result.is_err());
}
